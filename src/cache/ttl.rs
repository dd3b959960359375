//! TTL Module
//!
//! Caller-facing expiration requests and their resolution to a concrete duration.

use std::time::Duration;

// == Ttl ==
/// How long an entry should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the cache's configured default TTL.
    #[default]
    Default,
    /// Never expire.
    Never,
    /// Expire after the given duration. A zero duration means `Default`.
    After(Duration),
}

impl Ttl {
    /// Resolves to a concrete lifetime, `None` meaning "never expires".
    ///
    /// A zero result always maps to `None` so that a zero default never
    /// produces an entry that is expired on insertion.
    pub fn resolve(self, default_ttl: Duration) -> Option<Duration> {
        let duration = match self {
            Ttl::Never => return None,
            Ttl::Default => default_ttl,
            Ttl::After(d) if d.is_zero() => default_ttl,
            Ttl::After(d) => d,
        };
        (!duration.is_zero()).then_some(duration)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::After(duration)
    }
}
