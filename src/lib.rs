//! Tabular filter-and-aggregate pipeline behind the tender dashboard.
//!
//! The desktop binary owns the interaction loop; everything here is plain,
//! synchronous data work that can be driven from tests.

pub mod config;
pub mod data;

pub use config::DashboardConfig;
pub use data::error::{LoadError, Result};
