//! In-memory schema for detected text regions and review results.
//!
//! [`Annotation`] and [`Candidate`] are produced by the response parser and
//! never mutated afterwards. [`ReviewDecision`] and [`ApprovedSet`] are
//! derived from a [`crate::review::ReviewSession`] by a single approval step.
//!
//! The serde field names follow the extraction wire format (`ja`, `en_desc`)
//! so annotations can be saved and reloaded as the model would emit them.

use serde::{Deserialize, Serialize};

/// Bounding box on the normalised 0–1000 scale, ordered
/// `[ymin, xmin, ymax, xmax]`.
///
/// Values outside 0–1000 are kept as-is; the coordinate mapper projects them
/// off the page rather than clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BBox(pub [f32; 4]);

impl BBox {
    /// Upper bound of the normalised scale.
    pub const SCALE: f32 = 1000.0;

    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        Self([ymin, xmin, ymax, xmax])
    }

    pub fn ymin(&self) -> f32 {
        self.0[0]
    }

    pub fn xmin(&self) -> f32 {
        self.0[1]
    }

    pub fn ymax(&self) -> f32 {
        self.0[2]
    }

    pub fn xmax(&self) -> f32 {
        self.0[3]
    }

    /// `true` when the box has no positive area (`xmax <= xmin` or
    /// `ymax <= ymin`). Such boxes are still rendered.
    pub fn is_degenerate(&self) -> bool {
        self.xmax() <= self.xmin() || self.ymax() <= self.ymin()
    }
}

/// One proposed translation for a region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Candidate {
    /// Translated text in the target locale.
    #[serde(rename = "ja")]
    pub translated_text: String,
    /// Free-form label, e.g. "Standard" or "Shop Term".
    pub category: String,
    /// English rationale for the choice.
    #[serde(rename = "en_desc")]
    pub rationale: String,
}

impl Candidate {
    pub fn new(
        translated_text: impl Into<String>,
        category: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            translated_text: translated_text.into(),
            category: category.into(),
            rationale: rationale.into(),
        }
    }

    /// Presentation label: text, category, rationale. Carries no meaning
    /// in the data model.
    pub fn display_label(&self) -> String {
        format!(
            "{}  [{}] {}",
            self.translated_text, self.category, self.rationale
        )
    }
}

/// One detected original-language text region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub original: String,
    pub candidates: Vec<Candidate>,
    pub bbox: BBox,
}

impl Annotation {
    pub fn new(original: impl Into<String>, candidates: Vec<Candidate>, bbox: BBox) -> Self {
        Self {
            original: original.into(),
            candidates,
            bbox,
        }
    }

    /// The default choice: the first candidate in source order.
    pub fn default_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// The reviewer's final word on one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub original: String,
    pub approved_text: String,
    pub bbox: BBox,
}

/// Ordered, frozen list of decisions, one per annotation.
///
/// Only [`crate::review::ReviewSession::approve_all`] builds one. It
/// serialises for export but is never read back; saved decisions load as
/// plain `Vec<ReviewDecision>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ApprovedSet {
    decisions: Vec<ReviewDecision>,
}

impl ApprovedSet {
    pub(crate) fn from_decisions(decisions: Vec<ReviewDecision>) -> Self {
        Self { decisions }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReviewDecision> {
        self.decisions.iter()
    }

    pub fn decisions(&self) -> &[ReviewDecision] {
        &self.decisions
    }
}

impl<'a> IntoIterator for &'a ApprovedSet {
    type Item = &'a ReviewDecision;
    type IntoIter = std::slice::Iter<'a, ReviewDecision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_accessors_follow_wire_order() {
        let b = BBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.ymin(), 10.0);
        assert_eq!(b.xmin(), 20.0);
        assert_eq!(b.ymax(), 30.0);
        assert_eq!(b.xmax(), 40.0);
        assert!(!b.is_degenerate());
        assert!(BBox::default().is_degenerate());
    }

    #[test]
    fn candidate_uses_wire_field_names() {
        let c = Candidate::new("キリ 1/4", "Shop Term", "Preferred by craftsmen");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["ja"], "キリ 1/4");
        assert_eq!(json["en_desc"], "Preferred by craftsmen");
        assert_eq!(json["category"], "Shop Term");
    }

    #[test]
    fn display_label_composes_all_fields() {
        let c = Candidate::new("ドリル 1/4", "Standard", "Standard term");
        assert_eq!(c.display_label(), "ドリル 1/4  [Standard] Standard term");
    }

    #[test]
    fn approved_set_serialises_as_list() {
        let set = ApprovedSet::from_decisions(vec![ReviewDecision {
            original: "Drill 1/4".into(),
            approved_text: "キリ 1/4".into(),
            bbox: BBox::new(1.0, 2.0, 3.0, 4.0),
        }]);
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["bbox"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn exported_set_reads_back_as_plain_decisions() {
        let set = ApprovedSet::from_decisions(vec![ReviewDecision {
            original: "R5".into(),
            approved_text: "R5".into(),
            bbox: BBox::new(5.0, 6.0, 7.0, 8.0),
        }]);
        let json = serde_json::to_string(&set).unwrap();
        let back: Vec<ReviewDecision> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set.decisions());
    }
}
