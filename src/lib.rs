pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod editor;
pub mod storage;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
