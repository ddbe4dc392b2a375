pub mod candidate_claims;
pub mod detector_kind;
pub mod gaze_estimator;
pub mod landmark_model;
pub mod model_pool;
pub mod model_slot;
pub mod overlap_filter;
pub mod region_proposer;
