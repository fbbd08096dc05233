//! Cached game listings, search and detail lookups.
//!
//! Games are the high-cardinality dataset: never cached in full, only per
//! query. Each operation stores one entry keyed by its complete parameter
//! tuple. Entries are tagged with `games` plus the reference tags, because
//! every row is decorated with category and tag display names and renaming
//! a category must bust cached listings too.
//!
//! Decoration maps are derived from the reference cache *before* the cached
//! compute runs, so on a listing miss the only storage work is the page
//! fetch itself.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::pagination::{PageRequest, Pagination};
use crate::application::reference::ReferenceCache;
use crate::application::repos::{GameQueryFilter, GamesRepo, RepoError};
use crate::cache::{CacheStore, CacheTag, KeyBuilder};
use crate::domain::entities::{GameRecord, GameTagLink, GameTranslation};
use crate::domain::locale::LocaleFallback;
use crate::domain::types::GameSort;
use crate::domain::views::{CategoryLink, CategoryView, GameCard, GameDetail, TagLinkView, TagView};

/// Tags for entries that embed reference display names.
const LISTING_TAGS: [CacheTag; 3] = [CacheTag::Games, CacheTag::Categories, CacheTag::Tags];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameListing {
    pub games: Vec<GameCard>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGamesListing {
    pub category: CategoryView,
    pub games: Vec<GameCard>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagGamesListing {
    pub tag: TagView,
    pub games: Vec<GameCard>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchListing {
    pub query: String,
    pub games: Vec<GameCard>,
    pub pagination: Pagination,
}

pub struct GameCatalog {
    store: Arc<CacheStore>,
    games: Arc<dyn GamesRepo>,
    reference: Arc<ReferenceCache>,
    default_locale: String,
}

impl GameCatalog {
    pub fn new(
        store: Arc<CacheStore>,
        games: Arc<dyn GamesRepo>,
        reference: Arc<ReferenceCache>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            store,
            games,
            reference,
            default_locale: default_locale.into(),
        }
    }

    /// Games under a main category, most played first. `None` for an
    /// unknown slug. The total comes from the cached category game count.
    pub async fn games_by_category(
        &self,
        category_slug: &str,
        locale: &str,
        page: PageRequest,
    ) -> Result<Option<CategoryGamesListing>, AppError> {
        let categories = self.reference.categories_by_slug(locale).await?;
        let Some(category) = categories.get(category_slug).cloned() else {
            return Ok(None);
        };
        let maps = self.decoration_maps(locale).await?;

        let key = KeyBuilder::new()
            .push("slug", category_slug)
            .push("locale", locale)
            .push("page", page.page())
            .push("limit", page.per_page())
            .build("games_by_category");
        let repo = Arc::clone(&self.games);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let listing = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let filter = GameQueryFilter {
                    main_category_id: Some(category.id),
                    ..Default::default()
                };
                let (rows, _) = repo.list_games(&filter, GameSort::Popular, page).await?;
                let games =
                    load_cards(repo.as_ref(), rows, &locale, &base_locale, &maps).await?;
                let pagination = Pagination::compute(page, category.game_count);
                Ok(CategoryGamesListing {
                    category,
                    games,
                    pagination,
                })
            })
            .await?;
        Ok(Some(listing.as_ref().clone()))
    }

    /// Games carrying a tag, most played first. `None` for an unknown slug.
    pub async fn games_by_tag(
        &self,
        tag_slug: &str,
        locale: &str,
        page: PageRequest,
    ) -> Result<Option<TagGamesListing>, AppError> {
        let tags = self.reference.tags_by_slug(locale).await?;
        let Some(tag) = tags.get(tag_slug).cloned() else {
            return Ok(None);
        };
        let maps = self.decoration_maps(locale).await?;

        let key = KeyBuilder::new()
            .push("slug", tag_slug)
            .push("locale", locale)
            .push("page", page.page())
            .push("limit", page.per_page())
            .build("games_by_tag");
        let repo = Arc::clone(&self.games);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let listing = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let filter = GameQueryFilter {
                    tag_id: Some(tag.id),
                    ..Default::default()
                };
                let (rows, total) = repo.list_games(&filter, GameSort::Popular, page).await?;
                let games =
                    load_cards(repo.as_ref(), rows, &locale, &base_locale, &maps).await?;
                let pagination = Pagination::compute(page, total);
                Ok(TagGamesListing {
                    tag,
                    games,
                    pagination,
                })
            })
            .await?;
        Ok(Some(listing.as_ref().clone()))
    }

    /// Every published game, paginated.
    pub async fn all_games(
        &self,
        locale: &str,
        page: PageRequest,
    ) -> Result<GameListing, AppError> {
        let maps = self.decoration_maps(locale).await?;
        let key = KeyBuilder::new()
            .push("locale", locale)
            .push("page", page.page())
            .push("limit", page.per_page())
            .build("all_games");
        let repo = Arc::clone(&self.games);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let listing = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let filter = GameQueryFilter::default();
                let (rows, total) = repo.list_games(&filter, GameSort::Popular, page).await?;
                let games =
                    load_cards(repo.as_ref(), rows, &locale, &base_locale, &maps).await?;
                let pagination = Pagination::compute(page, total);
                Ok(GameListing { games, pagination })
            })
            .await?;
        Ok(listing.as_ref().clone())
    }

    /// Full-text search over base and translated titles/descriptions. A
    /// blank query returns an empty listing without touching storage.
    pub async fn search_games(
        &self,
        query: &str,
        locale: &str,
        page: PageRequest,
        sort: GameSort,
    ) -> Result<SearchListing, AppError> {
        let term = query.trim().to_string();
        if term.is_empty() {
            return Ok(SearchListing {
                query: term,
                games: Vec::new(),
                pagination: Pagination::empty(page),
            });
        }

        let maps = self.decoration_maps(locale).await?;
        let key = KeyBuilder::new()
            .push("q", &term)
            .push("locale", locale)
            .push("page", page.page())
            .push("limit", page.per_page())
            .push("sort", sort.as_str())
            .build("search_games");
        let repo = Arc::clone(&self.games);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let listing = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let filter = GameQueryFilter {
                    search: Some(term.clone()),
                    ..Default::default()
                };
                let (rows, total) = repo.list_games(&filter, sort, page).await?;
                let games =
                    load_cards(repo.as_ref(), rows, &locale, &base_locale, &maps).await?;
                let pagination = Pagination::compute(page, total);
                Ok(SearchListing {
                    query: term,
                    games,
                    pagination,
                })
            })
            .await?;
        Ok(listing.as_ref().clone())
    }

    /// Editorially featured games, most played first. When fewer than
    /// `limit` games are flagged, the rail is backfilled from the
    /// most-played listing, skipping games already present. Backfilled rows
    /// are presentation-only: the rail is unpaginated and they never count
    /// toward any listing total.
    pub async fn featured_games(
        &self,
        locale: &str,
        limit: u32,
    ) -> Result<Vec<GameCard>, AppError> {
        let featured = self
            .rail(
                "featured_games",
                locale,
                limit,
                GameQueryFilter {
                    featured: Some(true),
                    ..Default::default()
                },
                GameSort::Popular,
            )
            .await?;
        if featured.len() >= limit as usize {
            return Ok(featured);
        }

        let needed = limit as usize - featured.len();
        let most_played = self.most_played_games(locale, limit).await?;
        let present: std::collections::HashSet<&str> =
            featured.iter().map(|game| game.slug.as_str()).collect();
        let mut rail = featured.clone();
        rail.extend(
            most_played
                .into_iter()
                .filter(|game| !present.contains(game.slug.as_str()))
                .take(needed),
        );
        Ok(rail)
    }

    /// Most played games, for the homepage rail and featured backfill.
    pub async fn most_played_games(
        &self,
        locale: &str,
        limit: u32,
    ) -> Result<Vec<GameCard>, AppError> {
        self.rail(
            "most_played_games",
            locale,
            limit,
            GameQueryFilter::default(),
            GameSort::Popular,
        )
        .await
    }

    /// Most recently added games.
    pub async fn newest_games(&self, locale: &str, limit: u32) -> Result<Vec<GameCard>, AppError> {
        self.rail(
            "newest_games",
            locale,
            limit,
            GameQueryFilter::default(),
            GameSort::Newest,
        )
        .await
    }

    /// A single game with full decorations. `None` for an unknown slug so
    /// the caller can render a not-found page.
    pub async fn game_by_slug(
        &self,
        slug: &str,
        locale: &str,
    ) -> Result<Option<GameDetail>, AppError> {
        let maps = self.decoration_maps(locale).await?;
        let tag_links = {
            let tags = self.reference.tags_full(locale).await?;
            crate::application::derive::tag_link_by_id(&tags)
        };

        let key = KeyBuilder::new()
            .push("slug", slug)
            .push("locale", locale)
            .build("game_detail");
        let repo = Arc::clone(&self.games);
        let slug = slug.to_string();
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let detail = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let Some(row) = repo.find_by_slug(&slug).await? else {
                    return Ok(None);
                };
                let ids = [row.id];
                let translations = if locale == base_locale {
                    Vec::new()
                } else {
                    repo.list_translations(&ids, &locale).await?
                };
                let memberships = repo.list_game_tags(&ids).await?;
                Ok(Some(build_detail(
                    row,
                    &translations,
                    &memberships,
                    &locale,
                    &base_locale,
                    &maps.category_links,
                    &tag_links,
                )))
            })
            .await?;
        Ok(detail.as_ref().clone())
    }

    /// Shared implementation of the unpaginated rails.
    async fn rail(
        &self,
        operation: &'static str,
        locale: &str,
        limit: u32,
        filter: GameQueryFilter,
        sort: GameSort,
    ) -> Result<Vec<GameCard>, AppError> {
        let maps = self.decoration_maps(locale).await?;
        let key = KeyBuilder::new()
            .push("locale", locale)
            .push("limit", limit)
            .build(operation);
        let repo = Arc::clone(&self.games);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let page = PageRequest::first(limit);
        let cards = self
            .store
            .get_or_compute(key, &LISTING_TAGS, ttl, move || async move {
                let (rows, _) = repo.list_games(&filter, sort, page).await?;
                load_cards(repo.as_ref(), rows, &locale, &base_locale, &maps).await
            })
            .await?;
        Ok(cards.as_ref().clone())
    }

    async fn decoration_maps(&self, locale: &str) -> Result<DecorationMaps, AppError> {
        let category_links = self.reference.category_link_map(locale).await?;
        let tag_names = self.reference.tag_name_map(locale).await?;
        Ok(DecorationMaps {
            category_links,
            tag_names,
        })
    }
}

/// Reference display names attached to game rows.
#[derive(Debug, Clone)]
struct DecorationMaps {
    category_links: HashMap<Uuid, CategoryLink>,
    tag_names: HashMap<Uuid, String>,
}

/// Fetch the per-row companion data for a page of games and assemble cards.
async fn load_cards(
    repo: &dyn GamesRepo,
    rows: Vec<GameRecord>,
    locale: &str,
    base_locale: &str,
    maps: &DecorationMaps,
) -> Result<Vec<GameCard>, RepoError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let translations = if locale == base_locale || ids.is_empty() {
        Vec::new()
    } else {
        repo.list_translations(&ids, locale).await?
    };
    let memberships = if ids.is_empty() {
        Vec::new()
    } else {
        repo.list_game_tags(&ids).await?
    };
    Ok(build_cards(
        rows,
        &translations,
        &memberships,
        locale,
        base_locale,
        maps,
    ))
}

fn build_cards(
    rows: Vec<GameRecord>,
    translations: &[GameTranslation],
    memberships: &[GameTagLink],
    locale: &str,
    base_locale: &str,
    maps: &DecorationMaps,
) -> Vec<GameCard> {
    let fallback = LocaleFallback::new(locale, base_locale);
    let mut translations_by_game: HashMap<Uuid, Vec<&GameTranslation>> = HashMap::new();
    for translation in translations {
        translations_by_game
            .entry(translation.game_id)
            .or_default()
            .push(translation);
    }
    let mut tags_by_game: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for membership in memberships {
        tags_by_game
            .entry(membership.game_id)
            .or_default()
            .push(membership.tag_id);
    }
    let empty = Vec::new();

    rows.into_iter()
        .map(|row| {
            let rows_for = translations_by_game.get(&row.id).unwrap_or(&empty);
            let title = fallback.field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.title.as_deref(),
                &row.title,
            );
            let description = fallback.field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.description.as_deref(),
                row.description.as_deref().unwrap_or_default(),
            );
            let category = row
                .main_category_id
                .and_then(|id| maps.category_links.get(&id));
            // Disabled tags are absent from the map and silently dropped.
            let tags = tags_by_game
                .get(&row.id)
                .map(|tag_ids| {
                    tag_ids
                        .iter()
                        .filter_map(|tag_id| maps.tag_names.get(tag_id).cloned())
                        .collect()
                })
                .unwrap_or_default();
            GameCard {
                id: row.id,
                slug: row.slug,
                title,
                description,
                thumbnail: row.thumbnail,
                category_name: category.map(|link| link.name.clone()).unwrap_or_default(),
                category_slug: category.map(|link| link.slug.clone()).unwrap_or_default(),
                tags,
                play_count: row.play_count,
                rating: row.rating,
            }
        })
        .collect()
}

fn build_detail(
    row: GameRecord,
    translations: &[GameTranslation],
    memberships: &[GameTagLink],
    locale: &str,
    base_locale: &str,
    category_links: &HashMap<Uuid, CategoryLink>,
    tag_links: &HashMap<Uuid, TagLinkView>,
) -> GameDetail {
    let fallback = LocaleFallback::new(locale, base_locale);
    let rows_for: Vec<&GameTranslation> = translations
        .iter()
        .filter(|translation| translation.game_id == row.id)
        .collect();
    let title = fallback.field(
        &rows_for,
        |t| t.locale.as_str(),
        |t| t.title.as_deref(),
        &row.title,
    );
    let description = fallback.field(
        &rows_for,
        |t| t.locale.as_str(),
        |t| t.description.as_deref(),
        row.description.as_deref().unwrap_or_default(),
    );
    let tags = memberships
        .iter()
        .filter(|membership| membership.game_id == row.id)
        .filter_map(|membership| tag_links.get(&membership.tag_id).cloned())
        .collect();
    GameDetail {
        id: row.id,
        slug: row.slug,
        title,
        description,
        thumbnail: row.thumbnail,
        embed_url: row.embed_url,
        category: row
            .category_id
            .and_then(|id| category_links.get(&id).cloned()),
        main_category: row
            .main_category_id
            .and_then(|id| category_links.get(&id).cloned()),
        tags,
        play_count: row.play_count,
        rating: row.rating,
    }
}
