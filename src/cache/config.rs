//! Cache configuration.
//!
//! TTL tiers ladder from fast-moving listing data up to near-static
//! reference data. The tiers and the tag set are the only cache tunables.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::CacheSettings;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_TTL_SHORT: Duration = Duration::from_secs(60);
const DEFAULT_TTL_MEDIUM: Duration = Duration::from_secs(300);
const DEFAULT_TTL_STATS: Duration = Duration::from_secs(1_800);
const DEFAULT_TTL_LONG: Duration = Duration::from_secs(3_600);
const DEFAULT_TTL_BASE_DATA: Duration = Duration::from_secs(21_600);
const DEFAULT_TTL_VERY_LONG: Duration = Duration::from_secs(86_400);
const DEFAULT_COMPUTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache behavior knobs, normally sourced from [`CacheSettings`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Disabling the cache makes every read compute directly.
    pub enabled: bool,
    /// Maximum entries held before LRU eviction.
    pub capacity: usize,
    /// Listings that must react quickly.
    pub ttl_short: Duration,
    /// Filtered/paginated listings and search results.
    pub ttl_medium: Duration,
    /// Derived counts (games per category/tag).
    pub ttl_stats: Duration,
    /// Stable configuration-like data.
    pub ttl_long: Duration,
    /// Reference base data (names, descriptions, slugs).
    pub ttl_base_data: Duration,
    /// Nearly immutable data (languages).
    pub ttl_very_long: Duration,
    /// Upper bound on a single cache computation.
    pub compute_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            ttl_short: DEFAULT_TTL_SHORT,
            ttl_medium: DEFAULT_TTL_MEDIUM,
            ttl_stats: DEFAULT_TTL_STATS,
            ttl_long: DEFAULT_TTL_LONG,
            ttl_base_data: DEFAULT_TTL_BASE_DATA,
            ttl_very_long: DEFAULT_TTL_VERY_LONG,
            compute_timeout: DEFAULT_COMPUTE_TIMEOUT,
        }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity,
            ttl_short: Duration::from_secs(settings.ttl_short_secs),
            ttl_medium: Duration::from_secs(settings.ttl_medium_secs),
            ttl_stats: Duration::from_secs(settings.ttl_stats_secs),
            ttl_long: Duration::from_secs(settings.ttl_long_secs),
            ttl_base_data: Duration::from_secs(settings.ttl_base_data_secs),
            ttl_very_long: Duration::from_secs(settings.ttl_very_long_secs),
            compute_timeout: Duration::from_secs(settings.compute_timeout_secs),
        }
    }
}

impl CacheConfig {
    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
