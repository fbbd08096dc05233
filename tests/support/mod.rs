//! In-memory repositories for exercising the cache layer without Postgres.
//!
//! Every fetch increments an atomic counter so tests can assert exactly how
//! many times the cache reached for storage.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use playdex::application::pagination::PageRequest;
use playdex::application::repos::{
    CategoriesRepo, GameQueryFilter, GamesRepo, LanguagesRepo, RepoError, TagsRepo,
};
use playdex::application::{Catalog, CatalogRepos};
use playdex::cache::CacheConfig;
use playdex::domain::entities::{
    CategoryRecord, CategoryTranslation, GameRecord, GameTagLink, GameTranslation, LanguageRecord,
    TagRecord, TagTranslation,
};
use playdex::domain::types::{GameSort, GameStatus};

#[derive(Default)]
struct Data {
    categories: Vec<CategoryRecord>,
    category_translations: Vec<CategoryTranslation>,
    tags: Vec<TagRecord>,
    tag_translations: Vec<TagTranslation>,
    languages: Vec<LanguageRecord>,
    games: Vec<GameRecord>,
    game_translations: Vec<GameTranslation>,
    game_tags: Vec<GameTagLink>,
}

/// Mutable catalog fixture shared between the test and the repositories
/// handed to the cache.
#[derive(Default)]
pub struct MemoryCatalog {
    data: Mutex<Data>,
    fail_reads: AtomicBool,
    pub category_fetches: AtomicUsize,
    pub category_count_fetches: AtomicUsize,
    pub tag_fetches: AtomicUsize,
    pub tag_count_fetches: AtomicUsize,
    pub language_fetches: AtomicUsize,
    pub game_fetches: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        let catalog = Arc::new(Self::default());
        catalog.add_language("en", "English", true);
        catalog
    }

    /// Build a [`Catalog`] whose four repositories all point at this fixture.
    pub fn catalog(self: &Arc<Self>, cache: CacheConfig) -> Catalog {
        let repos = CatalogRepos {
            categories: self.clone(),
            tags: self.clone(),
            languages: self.clone(),
            games: self.clone(),
        };
        Catalog::new(repos, cache, "en")
    }

    /// Make every repository call fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(RepoError::Persistence("injected failure".into()))
        } else {
            Ok(())
        }
    }

    pub fn add_language(&self, code: &str, name: &str, is_default: bool) {
        let mut data = self.data.lock().unwrap();
        let sort_order = data.languages.len() as i32;
        data.languages.push(LanguageRecord {
            code: code.to_string(),
            name: name.to_string(),
            native_name: name.to_string(),
            flag: None,
            sort_order,
            enabled: true,
            is_default,
        });
    }

    pub fn add_category(&self, slug: &str, name: &str, parent_id: Option<Uuid>) -> Uuid {
        self.add_category_full(slug, name, parent_id, true)
    }

    pub fn add_category_full(
        &self,
        slug: &str,
        name: &str,
        parent_id: Option<Uuid>,
        enabled: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut data = self.data.lock().unwrap();
        let sort_order = data.categories.len() as i32;
        data.categories.push(CategoryRecord {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            description: None,
            icon: None,
            sort_order,
            parent_id,
            enabled,
            meta_title: None,
            meta_description: None,
            keywords: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn translate_category(&self, category_id: Uuid, locale: &str, name: &str) {
        self.data
            .lock()
            .unwrap()
            .category_translations
            .push(CategoryTranslation {
                category_id,
                locale: locale.to_string(),
                name: Some(name.to_string()),
                description: None,
                meta_title: None,
                meta_description: None,
                keywords: None,
            });
    }

    pub fn rename_category(&self, category_id: Uuid, name: &str) {
        let mut data = self.data.lock().unwrap();
        if let Some(category) = data
            .categories
            .iter_mut()
            .find(|category| category.id == category_id)
        {
            category.name = name.to_string();
            category.updated_at = OffsetDateTime::now_utc();
        }
    }

    pub fn add_tag(&self, slug: &str, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut data = self.data.lock().unwrap();
        let sort_order = data.tags.len() as i32;
        data.tags.push(TagRecord {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            icon: None,
            sort_order,
            enabled: true,
            meta_title: None,
            meta_description: None,
            keywords: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn translate_tag(&self, tag_id: Uuid, locale: &str, name: &str) {
        self.data.lock().unwrap().tag_translations.push(TagTranslation {
            tag_id,
            locale: locale.to_string(),
            name: Some(name.to_string()),
            meta_title: None,
            meta_description: None,
            keywords: None,
        });
    }

    pub fn add_game(
        &self,
        slug: &str,
        title: &str,
        main_category_id: Option<Uuid>,
        play_count: i64,
    ) -> Uuid {
        self.add_game_full(slug, title, main_category_id, play_count, false)
    }

    pub fn add_game_full(
        &self,
        slug: &str,
        title: &str,
        main_category_id: Option<Uuid>,
        play_count: i64,
        featured: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let mut data = self.data.lock().unwrap();
        data.games.push(GameRecord {
            id,
            slug: slug.to_string(),
            title: title.to_string(),
            description: None,
            thumbnail: None,
            embed_url: None,
            status: GameStatus::Published,
            featured,
            play_count,
            rating: None,
            category_id: main_category_id,
            main_category_id,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn translate_game(&self, game_id: Uuid, locale: &str, title: &str) {
        self.data.lock().unwrap().game_translations.push(GameTranslation {
            game_id,
            locale: locale.to_string(),
            title: Some(title.to_string()),
            description: None,
        });
    }

    pub fn tag_game(&self, game_id: Uuid, tag_id: Uuid) {
        self.data
            .lock()
            .unwrap()
            .game_tags
            .push(GameTagLink { game_id, tag_id });
    }
}

#[async_trait]
impl CategoriesRepo for MemoryCatalog {
    async fn list_categories(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        self.check_failure()?;
        self.category_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        Ok(data
            .categories
            .iter()
            .filter(|category| include_disabled || category.enabled)
            .cloned()
            .collect())
    }

    async fn list_translations(&self, locale: &str) -> Result<Vec<CategoryTranslation>, RepoError> {
        self.check_failure()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .category_translations
            .iter()
            .filter(|translation| translation.locale == locale)
            .cloned()
            .collect())
    }

    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError> {
        self.check_failure()?;
        self.category_count_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        let mut counts = HashMap::new();
        for category in &data.categories {
            let count = data
                .games
                .iter()
                .filter(|game| game.status == GameStatus::Published)
                .filter(|game| {
                    if category.parent_id.is_none() {
                        game.main_category_id == Some(category.id)
                    } else {
                        game.category_id == Some(category.id)
                    }
                })
                .count() as u64;
            counts.insert(category.id, count);
        }
        Ok(counts)
    }
}

#[async_trait]
impl TagsRepo for MemoryCatalog {
    async fn list_tags(&self, include_disabled: bool) -> Result<Vec<TagRecord>, RepoError> {
        self.check_failure()?;
        self.tag_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        Ok(data
            .tags
            .iter()
            .filter(|tag| include_disabled || tag.enabled)
            .cloned()
            .collect())
    }

    async fn list_translations(&self, locale: &str) -> Result<Vec<TagTranslation>, RepoError> {
        self.check_failure()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .tag_translations
            .iter()
            .filter(|translation| translation.locale == locale)
            .cloned()
            .collect())
    }

    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError> {
        self.check_failure()?;
        self.tag_count_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        let mut counts = HashMap::new();
        for tag in &data.tags {
            let count = data
                .game_tags
                .iter()
                .filter(|link| link.tag_id == tag.id)
                .filter(|link| {
                    data.games
                        .iter()
                        .any(|game| game.id == link.game_id && game.status == GameStatus::Published)
                })
                .count() as u64;
            counts.insert(tag.id, count);
        }
        Ok(counts)
    }
}

#[async_trait]
impl LanguagesRepo for MemoryCatalog {
    async fn list_languages(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<LanguageRecord>, RepoError> {
        self.check_failure()?;
        self.language_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        Ok(data
            .languages
            .iter()
            .filter(|language| include_disabled || language.enabled)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GamesRepo for MemoryCatalog {
    async fn list_games(
        &self,
        filter: &GameQueryFilter,
        sort: GameSort,
        page: PageRequest,
    ) -> Result<(Vec<GameRecord>, u64), RepoError> {
        self.check_failure()?;
        self.game_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();

        let mut matches: Vec<GameRecord> = data
            .games
            .iter()
            .filter(|game| game.status == GameStatus::Published)
            .filter(|game| {
                filter
                    .main_category_id
                    .is_none_or(|id| game.main_category_id == Some(id))
            })
            .filter(|game| filter.category_id.is_none_or(|id| game.category_id == Some(id)))
            .filter(|game| {
                filter.tag_id.is_none_or(|tag_id| {
                    data.game_tags
                        .iter()
                        .any(|link| link.game_id == game.id && link.tag_id == tag_id)
                })
            })
            .filter(|game| filter.featured.is_none_or(|featured| game.featured == featured))
            .filter(|game| {
                filter.search.as_deref().is_none_or(|term| {
                    let needle = term.to_lowercase();
                    game.title.to_lowercase().contains(&needle)
                        || game
                            .description
                            .as_deref()
                            .is_some_and(|text| text.to_lowercase().contains(&needle))
                        || data.game_translations.iter().any(|translation| {
                            translation.game_id == game.id
                                && (translation
                                    .title
                                    .as_deref()
                                    .is_some_and(|text| text.to_lowercase().contains(&needle))
                                    || translation
                                        .description
                                        .as_deref()
                                        .is_some_and(|text| text.to_lowercase().contains(&needle)))
                        })
                })
            })
            .cloned()
            .collect();

        match sort {
            GameSort::Popular => matches.sort_by(|a, b| {
                b.play_count
                    .cmp(&a.play_count)
                    .then_with(|| a.slug.cmp(&b.slug))
            }),
            GameSort::Newest => matches.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.slug.cmp(&b.slug))
            }),
            GameSort::Title => {
                matches.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
        }

        let total = matches.len() as u64;
        let offset = page.offset() as usize;
        let rows = matches
            .into_iter()
            .skip(offset)
            .take(page.per_page() as usize)
            .collect();
        Ok((rows, total))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GameRecord>, RepoError> {
        self.check_failure()?;
        self.game_fetches.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap();
        Ok(data
            .games
            .iter()
            .find(|game| game.slug == slug && game.status == GameStatus::Published)
            .cloned())
    }

    async fn list_translations(
        &self,
        game_ids: &[Uuid],
        locale: &str,
    ) -> Result<Vec<GameTranslation>, RepoError> {
        self.check_failure()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .game_translations
            .iter()
            .filter(|translation| {
                translation.locale == locale && game_ids.contains(&translation.game_id)
            })
            .cloned()
            .collect())
    }

    async fn list_game_tags(&self, game_ids: &[Uuid]) -> Result<Vec<GameTagLink>, RepoError> {
        self.check_failure()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .game_tags
            .iter()
            .filter(|link| game_ids.contains(&link.game_id))
            .copied()
            .collect())
    }
}
