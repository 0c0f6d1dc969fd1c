//! Core domain types for the virology dashboard.
//!
//! Holds the record/table model, filter criteria, the error taxonomy,
//! command-line settings, collection-date parsing and display formatting
//! shared by the data, runtime and UI crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DashboardError, Result};
