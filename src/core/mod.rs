//! Engine plumbing: constants, errors, configuration and the startup context.

pub mod config;
pub mod constants;
pub mod context;
pub mod error;

pub use config::*;
pub use constants::*;
pub use context::LevelingContext;
pub use error::{LevelingError, Result};
