use async_trait::async_trait;

use crate::application::repos::{LanguagesRepo, RepoError};
use crate::domain::entities::LanguageRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct LanguageRow {
    code: String,
    name: String,
    native_name: String,
    flag: Option<String>,
    sort_order: i32,
    enabled: bool,
    is_default: bool,
}

impl From<LanguageRow> for LanguageRecord {
    fn from(row: LanguageRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            native_name: row.native_name,
            flag: row.flag,
            sort_order: row.sort_order,
            enabled: row.enabled,
            is_default: row.is_default,
        }
    }
}

#[async_trait]
impl LanguagesRepo for PostgresRepositories {
    async fn list_languages(
        &self,
        include_disabled: bool,
    ) -> Result<Vec<LanguageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, LanguageRow>(
            "SELECT code, name, native_name, flag, sort_order, enabled, is_default \
             FROM languages \
             WHERE ($1 OR enabled) \
             ORDER BY sort_order ASC, code ASC",
        )
        .bind(include_disabled)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LanguageRecord::from).collect())
    }
}
