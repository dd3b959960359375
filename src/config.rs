//! Configuration Module
//!
//! Holds the expiration and sweeping parameters a cache is created with.

use std::time::Duration;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when a caller asks for `Ttl::Default`. Zero means entries never expire.
    pub default_ttl: Duration,
    /// Period between background sweeps. Zero disables the reaper.
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a config from explicit values.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_ttl,
            sweep_interval,
        }
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Returns true if a background reaper should run.
    pub fn reaper_enabled(&self) -> bool {
        !self.sweep_interval.is_zero()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert!(config.reaper_enabled());
    }

    #[test]
    fn test_config_builders() {
        let config = CacheConfig::default()
            .with_default_ttl(Duration::from_millis(50))
            .with_sweep_interval(Duration::ZERO);

        assert_eq!(config.default_ttl, Duration::from_millis(50));
        assert!(!config.reaper_enabled());
    }
}
