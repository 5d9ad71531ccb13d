//! Core types and configuration for the bhav analytics system.
//!
//! This crate provides shared types used across all other crates:
//! - End-of-day market data types (records, snapshots, rankings)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalyticsConfig, Config, HistoryConfig};
pub use error::{Error, Result};
pub use types::*;
