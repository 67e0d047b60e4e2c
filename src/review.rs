//! Review session: the reviewer's per-region choices.
//!
//! State is keyed by region index, never by text, so two regions that share
//! a candidate string cannot interfere. Each region starts on its first
//! candidate (source order, no re-sorting). A region without candidates has
//! no default and must be overridden before [`ReviewSession::approve_all`]
//! succeeds.
//!
//! The latest action wins: [`ReviewSession::select`] discards an override
//! on that region, and a blank override reverts to the selection.

use crate::annotation::{Annotation, ApprovedSet, ReviewDecision};
use crate::error::DrawingError;
use serde::Serialize;

/// One selectable option as shown to the reviewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOption {
    pub candidate_text: String,
    pub display_label: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RegionState {
    selection: Option<String>,
    override_text: Option<String>,
}

impl RegionState {
    fn approved_text(&self) -> Option<&str> {
        self.override_text.as_deref().or(self.selection.as_deref())
    }
}

/// Per-drawing review state built from a parsed annotation list.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSession {
    annotations: Vec<Annotation>,
    regions: Vec<RegionState>,
}

impl ReviewSession {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        let regions = annotations
            .iter()
            .map(|a| RegionState {
                selection: a.default_candidate().map(|c| c.translated_text.clone()),
                override_text: None,
            })
            .collect();
        Self {
            annotations,
            regions,
        }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, index: usize) -> Result<&Annotation, DrawingError> {
        self.annotations
            .get(index)
            .ok_or(DrawingError::RegionOutOfRange {
                index,
                total: self.annotations.len(),
            })
    }

    /// Candidates for region `index`, in source order.
    pub fn options(&self, index: usize) -> Result<Vec<ReviewOption>, DrawingError> {
        Ok(self
            .annotation(index)?
            .candidates
            .iter()
            .map(|c| ReviewOption {
                candidate_text: c.translated_text.clone(),
                display_label: c.display_label(),
            })
            .collect())
    }

    /// Pick one of the region's candidates by its text.
    pub fn select(&mut self, index: usize, candidate_text: &str) -> Result<(), DrawingError> {
        let known = self
            .annotation(index)?
            .candidates
            .iter()
            .any(|c| c.translated_text == candidate_text);
        if !known {
            return Err(DrawingError::UnknownCandidate {
                region: index,
                text: candidate_text.to_string(),
            });
        }

        let region = &mut self.regions[index];
        region.selection = Some(candidate_text.to_string());
        region.override_text = None;
        Ok(())
    }

    /// Replace the region's text with free input. Blank input clears the
    /// override.
    pub fn override_text(&mut self, index: usize, free_text: &str) -> Result<(), DrawingError> {
        self.annotation(index)?;
        self.regions[index].override_text = if free_text.trim().is_empty() {
            None
        } else {
            Some(free_text.to_string())
        };
        Ok(())
    }

    /// Currently selected candidate text, if any.
    pub fn selection(&self, index: usize) -> Result<Option<&str>, DrawingError> {
        self.annotation(index)?;
        Ok(self.regions[index].selection.as_deref())
    }

    /// The text that would be approved for the region right now.
    pub fn current_text(&self, index: usize) -> Result<Option<&str>, DrawingError> {
        self.annotation(index)?;
        Ok(self.regions[index].approved_text())
    }

    /// 0-based indices of regions with neither selection nor override.
    pub fn unresolved(&self) -> Vec<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.approved_text().is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Freeze the current state into an [`ApprovedSet`].
    ///
    /// Recomputed from scratch on every call; the result has exactly one
    /// decision per annotation, in annotation order.
    pub fn approve_all(&self) -> Result<ApprovedSet, DrawingError> {
        let unresolved = self.unresolved();
        if !unresolved.is_empty() {
            return Err(DrawingError::IncompleteReview {
                regions: unresolved.into_iter().map(|i| i + 1).collect(),
            });
        }

        let decisions = self
            .annotations
            .iter()
            .zip(&self.regions)
            .map(|(annotation, region)| ReviewDecision {
                original: annotation.original.clone(),
                approved_text: region.approved_text().unwrap_or_default().to_string(),
                bbox: annotation.bbox,
            })
            .collect();

        Ok(ApprovedSet::from_decisions(decisions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{BBox, Candidate};

    fn drill() -> Annotation {
        Annotation::new(
            "Drill 1/4",
            vec![
                Candidate::new("ドリル 1/4", "Standard", "Standard term"),
                Candidate::new("キリ 1/4", "Shop Term", "Preferred by craftsmen"),
            ],
            BBox::new(100.0, 200.0, 150.0, 400.0),
        )
    }

    fn bare() -> Annotation {
        Annotation::new("SEE NOTE 3", vec![], BBox::new(10.0, 10.0, 20.0, 90.0))
    }

    #[test]
    fn default_is_first_candidate() {
        let s = ReviewSession::new(vec![drill()]);
        assert_eq!(s.current_text(0).unwrap(), Some("ドリル 1/4"));
    }

    #[test]
    fn options_follow_source_order_with_labels() {
        let s = ReviewSession::new(vec![drill()]);
        let opts = s.options(0).unwrap();
        assert_eq!(opts.len(), 2);
        assert_eq!(opts[0].candidate_text, "ドリル 1/4");
        assert_eq!(opts[1].display_label, "キリ 1/4  [Shop Term] Preferred by craftsmen");
    }

    #[test]
    fn select_changes_choice() {
        let mut s = ReviewSession::new(vec![drill()]);
        s.select(0, "キリ 1/4").unwrap();
        assert_eq!(s.approve_all().unwrap().decisions()[0].approved_text, "キリ 1/4");
    }

    #[test]
    fn select_unknown_text_fails() {
        let mut s = ReviewSession::new(vec![drill()]);
        let err = s.select(0, "穴").unwrap_err();
        assert!(matches!(err, DrawingError::UnknownCandidate { region: 0, .. }));
        assert!(err.to_string().ends_with("region 1"));
    }

    #[test]
    fn out_of_range_index_fails() {
        let mut s = ReviewSession::new(vec![drill()]);
        assert!(matches!(
            s.options(3),
            Err(DrawingError::RegionOutOfRange { index: 3, total: 1 })
        ));
        assert!(s.select(1, "x").is_err());
        assert!(s.override_text(1, "x").is_err());
    }

    #[test]
    fn override_wins_until_next_select() {
        let mut s = ReviewSession::new(vec![drill()]);
        s.override_text(0, "キリ 6.35 通し").unwrap();
        assert_eq!(s.current_text(0).unwrap(), Some("キリ 6.35 通し"));

        s.select(0, "キリ 1/4").unwrap();
        assert_eq!(s.current_text(0).unwrap(), Some("キリ 1/4"));
    }

    #[test]
    fn blank_override_reverts_to_selection() {
        let mut s = ReviewSession::new(vec![drill()]);
        s.override_text(0, "edited").unwrap();
        s.override_text(0, "   ").unwrap();
        assert_eq!(s.current_text(0).unwrap(), Some("ドリル 1/4"));
    }

    #[test]
    fn zero_candidates_blocks_approval() {
        let s = ReviewSession::new(vec![drill(), bare()]);
        assert_eq!(s.selection(1).unwrap(), None);
        match s.approve_all() {
            Err(DrawingError::IncompleteReview { regions }) => assert_eq!(regions, vec![2]),
            other => panic!("expected IncompleteReview, got {other:?}"),
        }
    }

    #[test]
    fn override_resolves_zero_candidate_region() {
        let mut s = ReviewSession::new(vec![bare()]);
        s.override_text(0, "注記3参照").unwrap();
        let set = s.approve_all().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.decisions()[0].approved_text, "注記3参照");
    }

    #[test]
    fn single_candidate_round_trip() {
        let annotation = Annotation::new(
            "Deburr",
            vec![Candidate::new("バリ取り", "Standard", "Common")],
            BBox::new(1.0, 2.0, 3.0, 4.0),
        );
        let mut s = ReviewSession::new(vec![annotation.clone()]);
        s.select(0, "バリ取り").unwrap();
        let set = s.approve_all().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.decisions()[0].approved_text, "バリ取り");
        assert_eq!(set.decisions()[0].original, "Deburr");
        assert_eq!(set.decisions()[0].bbox, annotation.bbox);
    }

    #[test]
    fn duplicate_texts_across_regions_do_not_collide() {
        let mut s = ReviewSession::new(vec![drill(), drill()]);
        s.select(1, "キリ 1/4").unwrap();
        let set = s.approve_all().unwrap();
        assert_eq!(set.decisions()[0].approved_text, "ドリル 1/4");
        assert_eq!(set.decisions()[1].approved_text, "キリ 1/4");
    }

    #[test]
    fn approve_all_is_idempotent_and_recomputed() {
        let mut s = ReviewSession::new(vec![drill(), bare()]);
        s.override_text(1, "注記").unwrap();
        let first = s.approve_all().unwrap();
        let second = s.approve_all().unwrap();
        assert_eq!(first, second);

        s.select(0, "キリ 1/4").unwrap();
        let third = s.approve_all().unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(third.decisions()[0].approved_text, "キリ 1/4");
        assert_eq!(first.decisions()[0].approved_text, "ドリル 1/4");
    }

    #[test]
    fn empty_session_approves_to_empty_set() {
        let s = ReviewSession::new(vec![]);
        assert!(s.approve_all().unwrap().is_empty());
    }
}
