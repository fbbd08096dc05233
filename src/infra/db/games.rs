use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::repos::{GameQueryFilter, GamesRepo, RepoError};
use crate::domain::entities::{GameRecord, GameTagLink, GameTranslation};
use crate::domain::types::{GameSort, GameStatus};

use super::{PostgresRepositories, map_sqlx_error};

const GAME_COLUMNS: &str = "g.id, g.slug, g.title, g.description, g.thumbnail, g.embed_url, \
     g.status, g.featured, g.play_count, g.rating, g.category_id, g.main_category_id, \
     g.created_at, g.updated_at";

#[derive(sqlx::FromRow)]
struct GameRow {
    id: Uuid,
    slug: String,
    title: String,
    description: Option<String>,
    thumbnail: Option<String>,
    embed_url: Option<String>,
    status: GameStatus,
    featured: bool,
    play_count: i64,
    rating: Option<f32>,
    category_id: Option<Uuid>,
    main_category_id: Option<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<GameRow> for GameRecord {
    fn from(row: GameRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            embed_url: row.embed_url,
            status: row.status,
            featured: row.featured,
            play_count: row.play_count,
            rating: row.rating,
            category_id: row.category_id,
            main_category_id: row.main_category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GameTranslationRow {
    game_id: Uuid,
    locale: String,
    title: Option<String>,
    description: Option<String>,
}

impl From<GameTranslationRow> for GameTranslation {
    fn from(row: GameTranslationRow) -> Self {
        Self {
            game_id: row.game_id,
            locale: row.locale,
            title: row.title,
            description: row.description,
        }
    }
}

#[async_trait]
impl GamesRepo for PostgresRepositories {
    async fn list_games(
        &self,
        filter: &GameQueryFilter,
        sort: GameSort,
        page: PageRequest,
    ) -> Result<(Vec<GameRecord>, u64), RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {GAME_COLUMNS} FROM games g"));
        push_filter_conditions(&mut qb, filter);
        push_order(&mut qb, sort);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.per_page()));
        qb.push(" OFFSET ");
        qb.push_bind(page.offset() as i64);

        let rows: Vec<GameRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM games g");
        push_filter_conditions(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok((
            rows.into_iter().map(GameRecord::from).collect(),
            total.max(0) as u64,
        ))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GameRecord>, RepoError> {
        let row = sqlx::query_as::<_, GameRow>(&format!(
            "SELECT {GAME_COLUMNS} FROM games g \
             WHERE g.slug = $1 AND g.status = 'published'::game_status"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(GameRecord::from))
    }

    async fn list_translations(
        &self,
        game_ids: &[Uuid],
        locale: &str,
    ) -> Result<Vec<GameTranslation>, RepoError> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, GameTranslationRow>(
            "SELECT game_id, locale, title, description \
             FROM game_translations \
             WHERE game_id = ANY($1) AND locale = $2",
        )
        .bind(game_ids)
        .bind(locale)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GameTranslation::from).collect())
    }

    async fn list_game_tags(&self, game_ids: &[Uuid]) -> Result<Vec<GameTagLink>, RepoError> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT gt.game_id, gt.tag_id \
             FROM game_tags gt \
             INNER JOIN tags t ON t.id = gt.tag_id \
             WHERE gt.game_id = ANY($1) \
             ORDER BY gt.game_id, t.sort_order, t.slug",
        )
        .bind(game_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(game_id, tag_id)| GameTagLink { game_id, tag_id })
            .collect())
    }
}

fn push_filter_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &GameQueryFilter) {
    qb.push(" WHERE g.status = 'published'::game_status");
    if let Some(id) = filter.main_category_id {
        qb.push(" AND g.main_category_id = ");
        qb.push_bind(id);
    }
    if let Some(id) = filter.category_id {
        qb.push(" AND g.category_id = ");
        qb.push_bind(id);
    }
    if let Some(id) = filter.tag_id {
        qb.push(" AND EXISTS (SELECT 1 FROM game_tags gt WHERE gt.game_id = g.id AND gt.tag_id = ");
        qb.push_bind(id);
        qb.push(")");
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND g.featured = ");
        qb.push_bind(featured);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (g.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR g.description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM game_translations tr \
                   WHERE tr.game_id = g.id AND (tr.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR tr.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")))");
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: GameSort) {
    let order = match sort {
        GameSort::Popular => " ORDER BY g.play_count DESC, g.created_at DESC, g.id ASC",
        GameSort::Newest => " ORDER BY g.created_at DESC, g.id ASC",
        GameSort::Title => " ORDER BY LOWER(g.title) ASC, g.id ASC",
    };
    qb.push(order);
}

/// Escape LIKE metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
