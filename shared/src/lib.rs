//! Shared types and domain rules for the lot ledger
//!
//! This crate holds the models exchanged between the backend and any
//! presentation layer, plus the pure stock arithmetic the backend runs
//! inside its transactions. Nothing here performs IO.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
