//! Coordinate mapping: normalised bbox → PDF page space.
//!
//! The model reports boxes as `[ymin, xmin, ymax, xmax]` on a 0–1000 scale
//! with the origin at the top-left of the image. The output page is exactly
//! the image's pixel size with the origin at the bottom-left, so the vertical
//! axis is flipped. Out-of-range and inverted boxes pass straight through.

use crate::annotation::BBox;

/// Distance in points from the box's lower edge down to the text baseline.
pub const TEXT_OFFSET: f32 = 15.0;

/// Points the outline's lower-left corner sits below the text anchor.
pub const OUTLINE_DROP: f32 = 5.0;

/// A box mapped into page coordinates.
///
/// `(x, y)` is the text anchor. `width`/`height` may be zero or negative
/// for degenerate boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageRect {
    /// Outline rectangle as `(left, bottom, right, top)`.
    pub fn outline(&self) -> (f32, f32, f32, f32) {
        let bottom = self.y - OUTLINE_DROP;
        (self.x, bottom, self.x + self.width, bottom + self.height)
    }
}

/// Map a normalised bbox onto a page of `width_px` × `height_px`.
pub fn map_bbox(bbox: &BBox, width_px: u32, height_px: u32) -> PageRect {
    let w = width_px as f32;
    let h = height_px as f32;

    PageRect {
        x: (bbox.xmin() / BBox::SCALE) * w,
        y: h - (bbox.ymax() / BBox::SCALE) * h - TEXT_OFFSET,
        width: ((bbox.xmax() - bbox.xmin()) / BBox::SCALE) * w,
        height: ((bbox.ymax() - bbox.ymin()) / BBox::SCALE) * h,
    }
}
