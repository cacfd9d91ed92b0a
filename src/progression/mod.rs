//! Player progression: records, persistence, the service and its side effects.

pub mod attributes;
pub mod events;
pub mod record;
pub mod rewards;
pub mod rules;
pub mod service;
pub mod store;

pub use attributes::*;
pub use events::*;
pub use record::*;
pub use rewards::*;
pub use rules::*;
pub use service::*;
pub use store::*;
