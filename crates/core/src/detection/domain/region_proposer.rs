use crate::detection::domain::detector_kind::DetectorKind;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Error type returned by the external detection capabilities.
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// A proposed face box, not yet attached to any slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateRegion {
    pub rect: Rect,
    pub confidence: f64,
}

impl CandidateRegion {
    pub fn new(rect: Rect, confidence: f64) -> Self {
        Self { rect, confidence }
    }
}

/// Domain interface for face-region proposal (HOG/SVM, Haar, CNN cascade).
///
/// Receives the grayscale or colour frame depending on
/// [`DetectorKind::uses_grayscale`].
pub trait RegionProposer: Send {
    fn propose(
        &mut self,
        image: &Frame,
        kind: DetectorKind,
    ) -> Result<Vec<CandidateRegion>, CapabilityError>;
}
