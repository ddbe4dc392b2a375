pub mod fps_meter;
pub mod frame_mailbox;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod tracking_config;
pub mod tracking_cycle;
pub mod tracking_event;
