pub mod scripted_backend;
