//! Application services layer.

pub mod derive;
pub mod error;
pub mod games;
pub mod pagination;
pub mod reference;
pub mod repos;

use std::sync::Arc;

use crate::cache::{CacheConfig, CacheInvalidator, CacheStore};

use self::games::GameCatalog;
use self::reference::ReferenceCache;
use self::repos::{CategoriesRepo, GamesRepo, LanguagesRepo, TagsRepo};

/// The repository set the catalog reads from.
#[derive(Clone)]
pub struct CatalogRepos {
    pub categories: Arc<dyn CategoriesRepo>,
    pub tags: Arc<dyn TagsRepo>,
    pub languages: Arc<dyn LanguagesRepo>,
    pub games: Arc<dyn GamesRepo>,
}

/// Facade wiring one cache store into the read services and the
/// invalidation dispatcher. One instance per process; the embedding
/// application decides its lifetime and calls [`Catalog::shutdown`] on the
/// way out.
pub struct Catalog {
    store: Arc<CacheStore>,
    reference: Arc<ReferenceCache>,
    games: Arc<GameCatalog>,
    invalidator: CacheInvalidator,
}

impl Catalog {
    pub fn new(
        repos: CatalogRepos,
        cache_config: CacheConfig,
        default_locale: impl Into<String>,
    ) -> Self {
        let default_locale = default_locale.into();
        let store = Arc::new(CacheStore::new(cache_config));
        let reference = Arc::new(ReferenceCache::new(
            Arc::clone(&store),
            repos.categories,
            repos.tags,
            repos.languages,
            default_locale.clone(),
        ));
        let games = Arc::new(GameCatalog::new(
            Arc::clone(&store),
            repos.games,
            Arc::clone(&reference),
            default_locale,
        ));
        let invalidator = CacheInvalidator::new(Arc::clone(&store));
        Self {
            store,
            reference,
            games,
            invalidator,
        }
    }

    /// Reference dataset reads and derivations.
    pub fn reference(&self) -> &ReferenceCache {
        &self.reference
    }

    /// Game listing, search and detail reads.
    pub fn games(&self) -> &GameCatalog {
        &self.games
    }

    /// Entry point for write paths to bust cache tags.
    pub fn invalidator(&self) -> &CacheInvalidator {
        &self.invalidator
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Drop all cached state. Idempotent.
    pub fn shutdown(&self) {
        self.store.clear();
    }
}
