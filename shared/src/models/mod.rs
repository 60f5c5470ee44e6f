//! Domain models for the lot ledger

mod client;
mod dispatch;
mod lot;
mod movement;
mod product;

pub use client::*;
pub use dispatch::*;
pub use lot::*;
pub use movement::*;
pub use product::*;
