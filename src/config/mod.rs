//! Suggestion config
//!
//! Typed per-algorithm settings, the stores they are read from and the
//! resolver that turns raw store text into a validated `SuggestionConfig`.

pub mod quantity;
pub mod resolver;
pub mod store;
pub mod types;

pub use quantity::*;
pub use resolver::*;
pub use store::*;
pub use types::*;
