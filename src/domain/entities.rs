//! Catalog records mirrored from persistent storage.
//!
//! These are the rows the repositories return, before locale resolution.
//! Display fields on the base record hold the base-locale values; the
//! translation records carry per-locale overrides with every field optional.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::GameStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: i32,
    /// `None` marks a main category; `Some` points at the parent.
    pub parent_id: Option<Uuid>,
    pub enabled: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// At most one row per (category, locale).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTranslation {
    pub category_id: Uuid,
    pub locale: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub enabled: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// At most one row per (tag, locale).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagTranslation {
    pub tag_id: Uuid,
    pub locale: String,
    pub name: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageRecord {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag: Option<String>,
    pub sort_order: i32,
    pub enabled: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub embed_url: Option<String>,
    pub status: GameStatus,
    pub featured: bool,
    pub play_count: i64,
    pub rating: Option<f32>,
    /// Direct (sub)category assignment.
    pub category_id: Option<Uuid>,
    /// Main category the game rolls up under.
    pub main_category_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// At most one row per (game, locale).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameTranslation {
    pub game_id: Uuid,
    pub locale: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Tag membership row for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameTagLink {
    pub game_id: Uuid,
    pub tag_id: Uuid,
}
