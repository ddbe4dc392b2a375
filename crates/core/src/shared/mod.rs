pub mod camera;
pub mod constants;
pub mod face_observation;
pub mod frame;
pub mod geometry;
pub mod rect;
