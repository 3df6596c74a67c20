//! Screenshot service facade exposed to the embedding application.

pub mod screenshot_service;

pub use screenshot_service::ScreenshotService;
