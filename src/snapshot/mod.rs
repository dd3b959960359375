//! Snapshot Module
//!
//! Persistence of cache contents to and from byte streams.

mod codec;
mod registry;

pub use codec::{decode_entries, encode_store, MAGIC, VERSION};
pub use registry::ValueRegistry;
