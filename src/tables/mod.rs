//! Read-only lookup tables loaded from CSV files in the data directory.

pub mod defaults;
pub mod loader;
pub mod lookup;

pub use loader::{load_level_table, parse_delimited, DelimitedRow};
pub use lookup::*;
