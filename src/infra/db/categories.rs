use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CategoriesRepo, RepoError};
use crate::domain::entities::{CategoryRecord, CategoryTranslation};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    slug: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    sort_order: i32,
    parent_id: Option<Uuid>,
    enabled: bool,
    meta_title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            icon: row.icon,
            sort_order: row.sort_order,
            parent_id: row.parent_id,
            enabled: row.enabled,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            keywords: row.keywords,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryTranslationRow {
    category_id: Uuid,
    locale: String,
    name: Option<String>,
    description: Option<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
}

impl From<CategoryTranslationRow> for CategoryTranslation {
    fn from(row: CategoryTranslationRow) -> Self {
        Self {
            category_id: row.category_id,
            locale: row.locale,
            name: row.name,
            description: row.description,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            keywords: row.keywords,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_categories(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, name, description, icon, sort_order, parent_id, enabled, \
                    meta_title, meta_description, keywords, created_at, updated_at \
             FROM categories \
             WHERE ($1 OR enabled) \
             ORDER BY sort_order ASC, slug ASC",
        )
        .bind(include_disabled)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn list_translations(&self, locale: &str) -> Result<Vec<CategoryTranslation>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryTranslationRow>(
            "SELECT category_id, locale, name, description, meta_title, meta_description, keywords \
             FROM category_translations \
             WHERE locale = $1",
        )
        .bind(locale)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryTranslation::from).collect())
    }

    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError> {
        // Main categories count games through their main-category link,
        // subcategories through the direct assignment.
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT c.id, COUNT(g.id) \
             FROM categories c \
             LEFT JOIN games g \
                ON g.status = 'published'::game_status \
               AND ((c.parent_id IS NULL AND g.main_category_id = c.id) \
                 OR (c.parent_id IS NOT NULL AND g.category_id = c.id)) \
             GROUP BY c.id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }
}
