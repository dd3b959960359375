//! Cache Facade
//!
//! Public cache handle composing the store, the reaper and the snapshot codec.

use std::any::Any;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, StatsCounters, Ttl, Value};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::snapshot::{decode_entries, encode_store, ValueRegistry};
use crate::tasks::{spawn_reaper, ReaperHandle};

// == Cache ==
/// Thread-safe key-value cache with per-entry TTL.
///
/// Cloning a `Cache` creates another handle to the same data. The background
/// reaper stops when [`stop_reaper`](Self::stop_reaper) is called or when the
/// last handle is dropped.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use ttl_cache::{Cache, Ttl};
///
/// #[tokio::main]
/// async fn main() {
///     let cache = Cache::new(Duration::from_secs(300), Duration::from_secs(1));
///
///     cache.set("session:42", "alice".to_string(), Ttl::Default);
///     cache.set("config", 7u32, Ttl::Never);
///
///     let name = cache.get_as::<String>("session:42");
///     assert_eq!(name.as_deref().map(String::as_str), Some("alice"));
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Cache {
    store: Arc<RwLock<CacheStore>>,
    registry: Arc<ValueRegistry>,
    stats: Arc<StatsCounters>,
    reaper: Option<Arc<ReaperHandle>>,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache with the given default TTL and sweep interval.
    ///
    /// A zero `sweep_interval` disables the background reaper. Values of the
    /// types in [`ValueRegistry::with_builtins`] can be persisted.
    ///
    /// # Panics
    ///
    /// Panics if `sweep_interval` is non-zero and no Tokio runtime is running.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self::with_config(CacheConfig::new(default_ttl, sweep_interval))
    }

    /// Creates a cache from a config, with the builtin value registry.
    ///
    /// # Panics
    ///
    /// Panics if the reaper is enabled and no Tokio runtime is running.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_registry(config, ValueRegistry::with_builtins())
    }

    /// Creates a cache from a config and an explicit value registry.
    ///
    /// # Panics
    ///
    /// Panics if the reaper is enabled and no Tokio runtime is running.
    pub fn with_registry(config: CacheConfig, registry: ValueRegistry) -> Self {
        let store = Arc::new(RwLock::new(CacheStore::new(config.default_ttl)));
        let stats = Arc::new(StatsCounters::new());

        let reaper = if config.reaper_enabled() {
            if tokio::runtime::Handle::try_current().is_err() {
                panic!(
                    "ttl_cache::Cache needs a Tokio runtime to run its reaper. \
                     Create it from within a runtime, or use a zero sweep interval."
                );
            }
            Some(Arc::new(spawn_reaper(
                Arc::clone(&store),
                Arc::clone(&stats),
                config.sweep_interval,
            )))
        } else {
            None
        };

        Self {
            store,
            registry: Arc::new(registry),
            stats,
            reaper,
        }
    }

    // == Reads ==
    /// Returns the live value for `key`, or None if absent or expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.store.read().get(key);
        self.stats.record_lookup(value.is_some());
        value
    }

    /// Returns the live value for `key` if it is a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(|value| value.downcast::<T>())
    }

    /// Remaining lifetime of a live entry: `Some(None)` if it never expires.
    pub fn ttl(&self, key: &str) -> Option<Option<Duration>> {
        self.store.read().ttl_remaining(key)
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn count(&self) -> usize {
        self.store.read().len()
    }

    /// Current hit/miss/reclaim counters.
    pub fn stats(&self) -> CacheStats {
        let total = self.count();
        self.stats.snapshot(total)
    }

    // == Writes ==
    /// Stores a value, overwriting any existing entry.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, ttl: Ttl) {
        self.set_value(key, Value::new(value), ttl);
    }

    /// Stores an already-wrapped value, overwriting any existing entry.
    pub fn set_value(&self, key: impl Into<String>, value: Value, ttl: Ttl) {
        self.store.write().set(key.into(), value, ttl);
    }

    /// Stores a value only if no live entry exists for `key`.
    ///
    /// Fails with `AlreadyExists` otherwise, leaving the current value in place.
    pub fn add<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, ttl: Ttl) -> Result<()> {
        self.store.write().add(key.into(), Value::new(value), ttl)
    }

    /// Overwrites a value only if a live entry exists for `key`.
    ///
    /// Fails with `NotFound` otherwise, leaving the store unchanged.
    pub fn replace<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Ttl,
    ) -> Result<()> {
        self.store.write().replace(key.into(), Value::new(value), ttl)
    }

    /// Removes `key` if present.
    pub fn delete(&self, key: &str) {
        self.store.write().delete(key);
    }

    /// Removes every expired entry now. Returns how many were removed.
    pub fn delete_expired(&self) -> usize {
        let removed = self.store.write().sweep_expired();
        self.stats.record_reclaimed(removed);
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store.write().clear();
    }

    // == Persistence ==
    /// Writes a snapshot of every stored entry to `writer`.
    ///
    /// Writers are blocked until the snapshot is complete. Fails with
    /// `Encoding` if a stored value's type is not registered.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let store = self.store.read();
        encode_store(&store, &self.registry, writer)
    }

    /// Writes a snapshot to a file, creating or replacing it.
    ///
    /// The snapshot is encoded in memory and written to a sibling `.tmp` file
    /// that is renamed over `path`, so a failed save leaves any previous file
    /// intact.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let mut bytes: Vec<u8> = Vec::new();
        self.save(&mut bytes)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        if let Err(e) = write_synced(&tmp_path, &bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), bytes = bytes.len(), "Cache saved to file");
        Ok(())
    }

    /// Reads a snapshot from `reader` and merges it into the cache.
    ///
    /// The whole stream is decoded before the cache is touched. A loaded
    /// entry only replaces a missing or expired one; live data always wins.
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        let entries = decode_entries(&self.registry, reader)?;
        let total = entries.len();
        let merged = self.store.write().merge_snapshot(entries);

        info!(total, merged, "Snapshot loaded");
        Ok(())
    }

    /// Reads a snapshot from a file and merges it into the cache.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.load(BufReader::new(file))
    }

    // == Lifecycle ==
    /// Stops the background reaper. Repeated calls do nothing.
    ///
    /// Entries then only expire lazily: reads treat them as absent but they
    /// stay stored until deleted.
    pub fn stop_reaper(&self) {
        if let Some(reaper) = &self.reaper {
            reaper.stop();
        }
    }

    /// Returns true while a background reaper is active.
    pub fn is_reaper_running(&self) -> bool {
        self.reaper
            .as_ref()
            .is_some_and(|reaper| !reaper.is_stopped())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}
