pub mod config;

pub use config::SnapConfig;
