//! Utility modules: JSON persistence helpers.

pub mod persistence;

pub use persistence::*;
