pub mod capture;
pub use capture::*;

pub mod configuration;
pub use configuration::*;

pub mod error_handling;

pub mod service;
pub use service::*;

pub mod storage;
pub use storage::*;
