//! Cache invalidation dispatcher.
//!
//! Write paths call these methods after a successful mutation. A bust is
//! all-or-nothing per tag: every entry registered under the tag is
//! discarded, including entries that only embed the dataset indirectly
//! (game listings carry category and tag display names, so reference edits
//! bust the game listings too).

use std::sync::Arc;

use tracing::{debug, info};

use super::key::CacheTag;
use super::store::CacheStore;

pub struct CacheInvalidator {
    store: Arc<CacheStore>,
}

impl CacheInvalidator {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Bust a single tag.
    pub fn invalidate(&self, tag: CacheTag) {
        if !self.store.config().enabled {
            debug!(tag = %tag, "cache invalidation skipped: cache disabled");
            return;
        }
        let dropped = self.store.bust(tag);
        info!(tag = %tag, dropped, "cache invalidated");
    }

    /// A category was created, renamed, reordered, re-parented or deleted.
    /// Game listings embed category names, so they go too.
    pub fn category_changed(&self) {
        self.invalidate(CacheTag::Categories);
        self.invalidate(CacheTag::Games);
    }

    /// A tag was created, renamed or deleted.
    pub fn tag_changed(&self) {
        self.invalidate(CacheTag::Tags);
        self.invalidate(CacheTag::Games);
    }

    /// A game was created, updated or deleted. Reference game counts are
    /// left to expire through their stats TTL.
    pub fn game_changed(&self) {
        self.invalidate(CacheTag::Games);
    }

    /// The language set changed.
    pub fn language_changed(&self) {
        self.invalidate(CacheTag::Languages);
    }

    /// Drop every cached entry, regardless of tag.
    pub fn flush_all(&self) {
        if !self.store.config().enabled {
            debug!("cache flush skipped: cache disabled");
            return;
        }
        self.store.clear();
        info!("cache flushed");
    }
}
