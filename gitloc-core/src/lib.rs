//! gitloc core - shared data structures, errors, logging and configuration
//!
//! Everything the resolver, analyzer and command-line front end agree on lives here.

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
