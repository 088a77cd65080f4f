//! Data layer: core types, loading, clean-up, filtering and totals.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .parquet / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse source → Table (+ title caption)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐     ┌──────────┐
//!   │ normalize  │ ──▶ │ resolve   │  trim names, coerce numbers, find roles
//!   └───────────┘     └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐     ┌───────────┐
//!   │  filter   │ ──▶ │ aggregate  │  selections → filtered Table → sums
//!   └──────────┘     └───────────┘
//! ```
//! `pipeline` strings these together per dashboard page.

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
