//! Data layer for the virology dashboard.
//!
//! Responsible for loading uploaded result tables, filtering them to a
//! calendar year and month, computing the per-week and per-month
//! aggregations, and running the top-level report pipeline.

pub mod aggregator;
pub mod analysis;
pub mod filter;
pub mod histogram;
pub mod loader;

pub use dashboard_core as core;
