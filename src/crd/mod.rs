//! Custom Resource Definitions for the Suggestion composer
//!
//! - Suggestion: the request object every composed resource is owned by

pub mod suggestion;

pub use suggestion::*;
