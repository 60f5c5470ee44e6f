//! HTTP handlers
//!
//! Handlers only translate between HTTP and the service layer.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod dispatch;
pub mod health;
pub mod lot;
pub mod reporting;

pub use auth::*;
pub use catalog::*;
pub use client::*;
pub use dispatch::*;
pub use health::*;
pub use lot::*;
pub use reporting::*;
