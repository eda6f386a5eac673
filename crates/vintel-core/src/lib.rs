pub mod clock;
pub mod config;
pub mod content;
pub mod conversation;
pub mod countdown;
pub mod error;
pub mod investigation;
pub mod mood;
pub mod notification;
pub mod provider;
pub mod sequence;

// Re-export common error type
pub use error::{Result, VintelError};
