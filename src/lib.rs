//! Export the Okanjo farm commission report.
//! Logs in, pulls the commissions for a date window, writes them as raw JSON
//! and as a flat CSV, then ends the session.

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod session;

pub use client::Client;
pub use config::Config;
pub use error::{ApiError, ReportError};
pub use export::{FlatRow, write_flat_csv, write_flat_csv_to, write_raw_json};
pub use models::{Account, CommissionRecord, ReportFilters, ReportWindow, Session, SessionContext};
pub use pipeline::{RunSummary, run};
pub use session::ActiveSession;
