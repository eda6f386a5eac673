//! File-system backed services: config paths and the on-disk config file.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use paths::VintelPaths;
