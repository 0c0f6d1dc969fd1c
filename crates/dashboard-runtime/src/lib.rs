//! Runtime layer for the virology dashboard.
//!
//! Reads uploaded files asynchronously and owns the interactive session
//! state (current table, selection and report) consumed by the UI.

pub mod session;
pub mod upload;

pub use dashboard_core as core;
pub use dashboard_data as data;
