// Public modules
pub mod assets;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod executor;
pub mod git;
pub mod prompt;
pub mod session;
pub mod setup;
pub mod ssh;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
