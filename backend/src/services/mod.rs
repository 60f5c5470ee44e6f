//! Business logic services for the lot ledger

pub mod auth;
pub mod catalog;
pub mod client;
pub mod dispatch;
pub mod lot;
pub mod registration;
pub mod reporting;
pub mod stock;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use client::ClientService;
pub use dispatch::DispatchService;
pub use lot::LotService;
pub use registration::RegistrationService;
pub use reporting::ReportingService;
