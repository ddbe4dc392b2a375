pub mod face_tracking_service;
