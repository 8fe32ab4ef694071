pub mod config;
pub mod geometry;
pub mod frame_bridge;
pub mod rep_counter;
pub mod session_manager;

// Async driver for hosts running a tokio runtime
pub mod control_loop;
