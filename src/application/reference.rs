//! Reference dataset cache: full, locale-resolved snapshots.
//!
//! This is the only component that queries the category, tag and language
//! repositories. Each (dataset, locale) pair is fetched in one pass,
//! resolved via the locale fallback and cached whole.
//!
//! The public views split base data from derived counts: names and
//! descriptions change rarely and cache for hours, while game counts ride a
//! shorter stats TTL so a published game shows up in counts without busting
//! the base snapshot. The admin views include disabled rows and use a
//! single medium-TTL fetch.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::application::derive;
use crate::application::error::AppError;
use crate::application::repos::{CategoriesRepo, LanguagesRepo, RepoError, TagsRepo};
use crate::cache::{CacheKey, CacheStore, CacheTag, KeyBuilder};
use crate::domain::entities::{
    CategoryRecord, CategoryTranslation, LanguageRecord, TagRecord, TagTranslation,
};
use crate::domain::locale::LocaleFallback;
use crate::domain::views::{BreadcrumbEntry, CategoryLink, CategoryView, LanguageView, TagView};

pub struct ReferenceCache {
    store: Arc<CacheStore>,
    categories: Arc<dyn CategoriesRepo>,
    tags: Arc<dyn TagsRepo>,
    languages: Arc<dyn LanguagesRepo>,
    default_locale: String,
}

impl ReferenceCache {
    pub fn new(
        store: Arc<CacheStore>,
        categories: Arc<dyn CategoriesRepo>,
        tags: Arc<dyn TagsRepo>,
        languages: Arc<dyn LanguagesRepo>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            store,
            categories,
            tags,
            languages,
            default_locale: default_locale.into(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Full public category snapshot for a locale: enabled rows, resolved
    /// display fields, current game counts.
    pub async fn categories_full(&self, locale: &str) -> Result<Vec<CategoryView>, AppError> {
        let base = self.categories_base(locale).await?;
        let stats = self.category_stats().await?;
        Ok(merge_counts(base.as_ref(), &stats))
    }

    /// Admin category snapshot: every row including disabled ones, counts
    /// fetched in the same pass, shorter TTL.
    pub async fn categories_admin(&self, locale: &str) -> Result<Vec<CategoryView>, AppError> {
        let key = locale_key("categories_admin", locale);
        let repo = Arc::clone(&self.categories);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let views = self
            .store
            .get_or_compute(key, &[CacheTag::Categories], ttl, move || async move {
                let rows = repo.list_categories(true).await?;
                let translations = fetch_when_translated(&locale, &base_locale, || {
                    repo.list_translations(&locale)
                })
                .await?;
                let counts = repo.game_counts().await?;
                Ok(resolve_categories(
                    rows,
                    translations,
                    &locale,
                    &base_locale,
                    Some(&counts),
                ))
            })
            .await?;
        Ok(views.as_ref().clone())
    }

    async fn categories_base(&self, locale: &str) -> Result<Arc<Vec<CategoryView>>, AppError> {
        let key = locale_key("categories_base", locale);
        let repo = Arc::clone(&self.categories);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_base_data;
        let views = self
            .store
            .get_or_compute(key, &[CacheTag::Categories], ttl, move || async move {
                let rows = repo.list_categories(false).await?;
                let translations = fetch_when_translated(&locale, &base_locale, || {
                    repo.list_translations(&locale)
                })
                .await?;
                Ok(resolve_categories(
                    rows,
                    translations,
                    &locale,
                    &base_locale,
                    None,
                ))
            })
            .await?;
        Ok(views)
    }

    async fn category_stats(&self) -> Result<Arc<HashMap<Uuid, u64>>, AppError> {
        let repo = Arc::clone(&self.categories);
        let ttl = self.store.config().ttl_stats;
        let counts = self
            .store
            .get_or_compute(
                CacheKey::bare("categories_stats"),
                &[CacheTag::Categories],
                ttl,
                move || async move { repo.game_counts().await },
            )
            .await?;
        Ok(counts)
    }

    // ========================================================================
    // Tags
    // ========================================================================

    /// Full public tag snapshot for a locale.
    pub async fn tags_full(&self, locale: &str) -> Result<Vec<TagView>, AppError> {
        let base = self.tags_base(locale).await?;
        let stats = self.tag_stats().await?;
        Ok(merge_tag_counts(base.as_ref(), &stats))
    }

    /// Admin tag snapshot including disabled rows.
    pub async fn tags_admin(&self, locale: &str) -> Result<Vec<TagView>, AppError> {
        let key = locale_key("tags_admin", locale);
        let repo = Arc::clone(&self.tags);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_medium;
        let views = self
            .store
            .get_or_compute(key, &[CacheTag::Tags], ttl, move || async move {
                let rows = repo.list_tags(true).await?;
                let translations = fetch_when_translated(&locale, &base_locale, || {
                    repo.list_translations(&locale)
                })
                .await?;
                let counts = repo.game_counts().await?;
                Ok(resolve_tags(
                    rows,
                    translations,
                    &locale,
                    &base_locale,
                    Some(&counts),
                ))
            })
            .await?;
        Ok(views.as_ref().clone())
    }

    async fn tags_base(&self, locale: &str) -> Result<Arc<Vec<TagView>>, AppError> {
        let key = locale_key("tags_base", locale);
        let repo = Arc::clone(&self.tags);
        let locale = locale.to_string();
        let base_locale = self.default_locale.clone();
        let ttl = self.store.config().ttl_base_data;
        let views = self
            .store
            .get_or_compute(key, &[CacheTag::Tags], ttl, move || async move {
                let rows = repo.list_tags(false).await?;
                let translations = fetch_when_translated(&locale, &base_locale, || {
                    repo.list_translations(&locale)
                })
                .await?;
                Ok(resolve_tags(rows, translations, &locale, &base_locale, None))
            })
            .await?;
        Ok(views)
    }

    async fn tag_stats(&self) -> Result<Arc<HashMap<Uuid, u64>>, AppError> {
        let repo = Arc::clone(&self.tags);
        let ttl = self.store.config().ttl_stats;
        let counts = self
            .store
            .get_or_compute(
                CacheKey::bare("tags_stats"),
                &[CacheTag::Tags],
                ttl,
                move || async move { repo.game_counts().await },
            )
            .await?;
        Ok(counts)
    }

    // ========================================================================
    // Languages
    // ========================================================================

    /// Enabled languages in display order.
    pub async fn languages(&self) -> Result<Vec<LanguageView>, AppError> {
        let repo = Arc::clone(&self.languages);
        let ttl = self.store.config().ttl_very_long;
        let views = self
            .store
            .get_or_compute(
                CacheKey::bare("languages"),
                &[CacheTag::Languages],
                ttl,
                move || async move {
                    let mut rows = repo.list_languages(false).await?;
                    rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.code.cmp(&b.code)));
                    Ok(rows.into_iter().map(language_view).collect::<Vec<_>>())
                },
            )
            .await?;
        Ok(views.as_ref().clone())
    }

    /// The designated default language, falling back to the first enabled
    /// one. `None` only when the language table is empty.
    pub async fn default_language(&self) -> Result<Option<LanguageView>, AppError> {
        let languages = self.languages().await?;
        let designated = languages.iter().find(|language| language.is_default).cloned();
        Ok(designated.or_else(|| languages.into_iter().next()))
    }

    // ========================================================================
    // Derived lookups (no storage access beyond the cached snapshots)
    // ========================================================================

    pub async fn category_name_map(&self, locale: &str) -> Result<HashMap<Uuid, String>, AppError> {
        Ok(derive::category_name_by_id(&self.categories_full(locale).await?))
    }

    pub async fn category_link_map(
        &self,
        locale: &str,
    ) -> Result<HashMap<Uuid, CategoryLink>, AppError> {
        Ok(derive::category_link_by_id(&self.categories_full(locale).await?))
    }

    pub async fn categories_by_slug(
        &self,
        locale: &str,
    ) -> Result<HashMap<String, CategoryView>, AppError> {
        Ok(derive::categories_by_slug(&self.categories_full(locale).await?))
    }

    pub async fn main_categories(&self, locale: &str) -> Result<Vec<CategoryView>, AppError> {
        Ok(derive::main_categories(&self.categories_full(locale).await?))
    }

    pub async fn sub_categories(&self, locale: &str) -> Result<Vec<CategoryView>, AppError> {
        Ok(derive::sub_categories(&self.categories_full(locale).await?))
    }

    pub async fn sub_categories_of_slug(
        &self,
        parent_slug: &str,
        locale: &str,
    ) -> Result<Vec<CategoryView>, AppError> {
        Ok(derive::sub_categories_of_slug(
            &self.categories_full(locale).await?,
            parent_slug,
        ))
    }

    pub async fn category_breadcrumb(
        &self,
        slug: &str,
        locale: &str,
    ) -> Result<Vec<BreadcrumbEntry>, AppError> {
        Ok(derive::category_breadcrumb(
            &self.categories_full(locale).await?,
            slug,
        ))
    }

    pub async fn top_categories(
        &self,
        locale: &str,
        n: usize,
    ) -> Result<Vec<CategoryView>, AppError> {
        Ok(derive::top_categories(
            &self.categories_full(locale).await?,
            n,
        ))
    }

    pub async fn tag_name_map(&self, locale: &str) -> Result<HashMap<Uuid, String>, AppError> {
        Ok(derive::tag_name_by_id(&self.tags_full(locale).await?))
    }

    pub async fn tags_by_slug(&self, locale: &str) -> Result<HashMap<String, TagView>, AppError> {
        Ok(derive::tags_by_slug(&self.tags_full(locale).await?))
    }

    pub async fn top_tags(&self, locale: &str, n: usize) -> Result<Vec<TagView>, AppError> {
        Ok(derive::top_tags(&self.tags_full(locale).await?, n))
    }
}

// ============================================================================
// Resolution helpers
// ============================================================================

/// Skip the translation fetch entirely when the requested locale is the
/// base locale.
async fn fetch_when_translated<T, F, Fut>(
    locale: &str,
    base_locale: &str,
    fetch: F,
) -> Result<Vec<T>, RepoError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, RepoError>>,
{
    if locale == base_locale {
        Ok(Vec::new())
    } else {
        fetch().await
    }
}

fn resolve_categories(
    mut rows: Vec<CategoryRecord>,
    translations: Vec<CategoryTranslation>,
    locale: &str,
    base_locale: &str,
    counts: Option<&HashMap<Uuid, u64>>,
) -> Vec<CategoryView> {
    rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.slug.cmp(&b.slug)));
    let fallback = LocaleFallback::new(locale, base_locale);
    let mut by_category: HashMap<Uuid, Vec<CategoryTranslation>> = HashMap::new();
    for translation in translations {
        by_category
            .entry(translation.category_id)
            .or_default()
            .push(translation);
    }
    let empty = Vec::new();

    rows.into_iter()
        .map(|row| {
            let rows_for = by_category.get(&row.id).unwrap_or(&empty);
            let name = fallback.field(rows_for, |t| t.locale.as_str(), |t| t.name.as_deref(), &row.name);
            let description = fallback.field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.description.as_deref(),
                row.description.as_deref().unwrap_or_default(),
            );
            let meta_title = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.meta_title.as_deref(),
                row.meta_title.as_deref(),
            );
            let meta_description = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.meta_description.as_deref(),
                row.meta_description.as_deref(),
            );
            let keywords = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.keywords.as_deref(),
                row.keywords.as_deref(),
            );
            let game_count = counts
                .and_then(|counts| counts.get(&row.id).copied())
                .unwrap_or(0);
            CategoryView {
                id: row.id,
                slug: row.slug,
                name,
                description,
                icon: row.icon,
                sort_order: row.sort_order,
                parent_id: row.parent_id,
                enabled: row.enabled,
                game_count,
                meta_title,
                meta_description,
                keywords,
            }
        })
        .collect()
}

fn resolve_tags(
    mut rows: Vec<TagRecord>,
    translations: Vec<TagTranslation>,
    locale: &str,
    base_locale: &str,
    counts: Option<&HashMap<Uuid, u64>>,
) -> Vec<TagView> {
    rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.slug.cmp(&b.slug)));
    let fallback = LocaleFallback::new(locale, base_locale);
    let mut by_tag: HashMap<Uuid, Vec<TagTranslation>> = HashMap::new();
    for translation in translations {
        by_tag.entry(translation.tag_id).or_default().push(translation);
    }
    let empty = Vec::new();

    rows.into_iter()
        .map(|row| {
            let rows_for = by_tag.get(&row.id).unwrap_or(&empty);
            let name = fallback.field(rows_for, |t| t.locale.as_str(), |t| t.name.as_deref(), &row.name);
            let meta_title = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.meta_title.as_deref(),
                row.meta_title.as_deref(),
            );
            let meta_description = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.meta_description.as_deref(),
                row.meta_description.as_deref(),
            );
            let keywords = fallback.optional_field(
                rows_for,
                |t| t.locale.as_str(),
                |t| t.keywords.as_deref(),
                row.keywords.as_deref(),
            );
            let game_count = counts
                .and_then(|counts| counts.get(&row.id).copied())
                .unwrap_or(0);
            TagView {
                id: row.id,
                slug: row.slug,
                name,
                icon: row.icon,
                sort_order: row.sort_order,
                enabled: row.enabled,
                game_count,
                meta_title,
                meta_description,
                keywords,
            }
        })
        .collect()
}

fn language_view(row: LanguageRecord) -> LanguageView {
    LanguageView {
        code: row.code,
        name: row.name,
        native_name: row.native_name,
        flag: row.flag,
        is_default: row.is_default,
    }
}

fn merge_counts(base: &[CategoryView], counts: &HashMap<Uuid, u64>) -> Vec<CategoryView> {
    base.iter()
        .map(|view| {
            let mut merged = view.clone();
            merged.game_count = counts.get(&view.id).copied().unwrap_or(0);
            merged
        })
        .collect()
}

fn merge_tag_counts(base: &[TagView], counts: &HashMap<Uuid, u64>) -> Vec<TagView> {
    base.iter()
        .map(|view| {
            let mut merged = view.clone();
            merged.game_count = counts.get(&view.id).copied().unwrap_or(0);
            merged
        })
        .collect()
}

fn locale_key(operation: &'static str, locale: &str) -> CacheKey {
    KeyBuilder::new().push("locale", locale).build(operation)
}
