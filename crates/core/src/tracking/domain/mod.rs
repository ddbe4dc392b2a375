pub mod identity_tracker;
pub mod locatable;
pub mod nearest_neighbor;
pub mod tracked_face;
