//! Repository traits describing persistence adapters.
//!
//! The cache layer treats storage as opaque: given a filter, a sort and a
//! page, a repository returns rows plus the translation and membership rows
//! needed to resolve them. Reference repositories are only ever called from
//! the reference cache; the games repository only from inside query-cache
//! computations.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{
    CategoryRecord, CategoryTranslation, GameRecord, GameTagLink, GameTranslation, LanguageRecord,
    TagRecord, TagTranslation,
};
use crate::domain::types::GameSort;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Filter applied to game listings. Every populated field both narrows the
/// query and participates in the cache key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameQueryFilter {
    /// Games rolling up under this main category.
    pub main_category_id: Option<Uuid>,
    /// Games directly assigned to this (sub)category.
    pub category_id: Option<Uuid>,
    /// Games carrying this tag.
    pub tag_id: Option<Uuid>,
    pub featured: Option<bool>,
    /// Case-insensitive substring over base and translated title/description.
    pub search: Option<String>,
}

impl GameQueryFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All category rows; the public view passes `include_disabled = false`.
    async fn list_categories(&self, include_disabled: bool)
    -> Result<Vec<CategoryRecord>, RepoError>;

    /// Translation rows for one locale across all categories.
    async fn list_translations(&self, locale: &str) -> Result<Vec<CategoryTranslation>, RepoError>;

    /// Published-game count per category id (main link for main categories,
    /// direct link for subcategories).
    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError>;
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn list_tags(&self, include_disabled: bool) -> Result<Vec<TagRecord>, RepoError>;

    async fn list_translations(&self, locale: &str) -> Result<Vec<TagTranslation>, RepoError>;

    /// Published-game count per tag id.
    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError>;
}

#[async_trait]
pub trait LanguagesRepo: Send + Sync {
    async fn list_languages(&self, include_disabled: bool)
    -> Result<Vec<LanguageRecord>, RepoError>;
}

#[async_trait]
pub trait GamesRepo: Send + Sync {
    /// One page of published games matching `filter`, plus the total match
    /// count.
    async fn list_games(
        &self,
        filter: &GameQueryFilter,
        sort: GameSort,
        page: PageRequest,
    ) -> Result<(Vec<GameRecord>, u64), RepoError>;

    /// A single published game, `None` when the slug is unknown.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<GameRecord>, RepoError>;

    /// Translation rows for the given games in one locale.
    async fn list_translations(
        &self,
        game_ids: &[Uuid],
        locale: &str,
    ) -> Result<Vec<GameTranslation>, RepoError>;

    /// Tag memberships for the given games.
    async fn list_game_tags(&self, game_ids: &[Uuid]) -> Result<Vec<GameTagLink>, RepoError>;
}
