//! Stockwatch Common - Shared configuration, errors, and logging.
//!
//! This crate provides:
//! - Configuration types and loading (`~/.stockwatch/config.json` + env overrides)
//! - The unified error type used by storage and configuration code
//! - Logging setup with noise filtering for HTTP client internals

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    AggregationConfig, ApiConfig, Config, NewsConfig, ObservabilityConfig, SearchConfig,
    StorageConfig, WatchlistConfig,
};
pub use error::{Error, Result, ResultExt};
