//! API Module
//!
//! Public cache handle used by host applications.

mod cache;

pub use cache::Cache;
