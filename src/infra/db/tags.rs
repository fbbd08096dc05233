use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, TagsRepo};
use crate::domain::entities::{TagRecord, TagTranslation};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    slug: String,
    name: String,
    icon: Option<String>,
    sort_order: i32,
    enabled: bool,
    meta_title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            icon: row.icon,
            sort_order: row.sort_order,
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
struct TagTranslationRow {
    tag_id: Uuid,
    locale: String,
    name: Option<String>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
}

impl From<TagTranslationRow> for TagTranslation {
    fn from(row: TagTranslationRow) -> Self {
        Self {
            tag_id: row.tag_id,
            locale: row.locale,
            name: row.name,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            keywords: row.keywords,
        }
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_tags(&self, include_disabled: bool) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, slug, name, icon, sort_order, enabled, \
                    meta_title, meta_description, keywords, created_at, updated_at \
             FROM tags \
             WHERE ($1 OR enabled) \
             ORDER BY sort_order ASC, slug ASC",
        )
        .bind(include_disabled)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn list_translations(&self, locale: &str) -> Result<Vec<TagTranslation>, RepoError> {
        let rows = sqlx::query_as::<_, TagTranslationRow>(
            "SELECT tag_id, locale, name, meta_title, meta_description, keywords \
             FROM tag_translations \
             WHERE locale = $1",
        )
        .bind(locale)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagTranslation::from).collect())
    }

    async fn game_counts(&self) -> Result<HashMap<Uuid, u64>, RepoError> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT t.id, COUNT(g.id) \
             FROM tags t \
             LEFT JOIN game_tags gt ON gt.tag_id = t.id \
             LEFT JOIN games g \
                ON g.id = gt.game_id \
               AND g.status = 'published'::game_status \
             GROUP BY t.id",
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
