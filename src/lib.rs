//! TTL Cache - An in-process key-value cache
//!
//! Provides per-entry TTL expiration, a background reaper that reclaims
//! expired entries, and binary snapshots for persisting cache contents
//! across restarts.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod tasks;

pub use api::Cache;
pub use cache::{CacheStats, Ttl, Value};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use snapshot::ValueRegistry;
