//! Multi-source eligibility checks for community events.
//!
//! [`engine`] accumulates rule results over an account's sources; [`catalog`] holds the
//! events and their rule sets; [`service`] ties both to an [`sources::AccountStore`] and
//! exposes them over HTTP and CSV.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod sources;
pub mod telemetry;

pub use catalog::{Event, EventCatalog, EventSummary};
pub use config::AppConfig;
pub use error::AppError;
pub use service::{eligibility_router, EligibilityReport, EligibilityRequest, EligibilityService};
