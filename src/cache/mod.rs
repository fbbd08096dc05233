//! Playdex cache system.
//!
//! A single get-or-compute store backs two entry families:
//!
//! - **Reference entries**: full locale-resolved snapshots of the bounded
//!   reference datasets (long TTLs).
//! - **Query entries**: paginated/filtered game listings and search results
//!   keyed by their complete parameter tuple (shorter TTLs).
//!
//! Every entry registers under one or more invalidation tags; write paths
//! bust tags through [`CacheInvalidator`].

mod config;
mod invalidate;
mod key;
mod lock;
mod store;

pub use config::CacheConfig;
pub use invalidate::CacheInvalidator;
pub use key::{CacheKey, CacheTag, KeyBuilder};
pub use store::{CacheError, CacheStore};
