pub mod affinity;
pub mod detector;
pub mod error;
pub mod launcher;
pub mod locator;
pub mod orchestrator;
pub mod platform;
pub mod service_control;
pub mod settings;
pub mod suspend;
pub mod targets;
#[cfg(windows)]
pub mod win32;
