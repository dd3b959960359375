//! Cache Module
//!
//! In-memory entry storage with TTL expiration.

mod entry;
mod stats;
mod store;
mod ttl;
mod value;


// Re-export public types
pub use entry::{current_timestamp_ns, CacheEntry};
pub use stats::{CacheStats, StatsCounters};
pub use store::CacheStore;
pub use ttl::Ttl;
pub use value::Value;
