use crate::detection::domain::region_proposer::CandidateRegion;
use crate::shared::rect::Rect;

/// Drops proposals that an active slot is already tracking.
///
/// A candidate is discarded when its [`Rect::tracker_overlap`] with any
/// active box exceeds `threshold`. Survivors keep their original order.
pub fn non_overlapping(
    active_boxes: &[Rect],
    candidates: Vec<CandidateRegion>,
    threshold: f64,
) -> Vec<CandidateRegion> {
    if active_boxes.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| {
            !active_boxes
                .iter()
                .any(|b| b.tracker_overlap(&c.rect) > threshold)
        })
        .collect()
}
