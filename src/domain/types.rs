//! Shared catalog enumerations.

use serde::{Deserialize, Serialize};

/// Publication state of a game. Only published games are visible on the
/// public site; the admin surface sees every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "game_status", rename_all = "lowercase")]
pub enum GameStatus {
    Draft,
    Published,
    Archived,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Draft => "draft",
            GameStatus::Published => "published",
            GameStatus::Archived => "archived",
        }
    }
}

/// Ordering applied to game listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameSort {
    /// Most played first.
    #[default]
    Popular,
    /// Most recently created first.
    Newest,
    /// Title, ascending.
    Title,
}

impl GameSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameSort::Popular => "popular",
            GameSort::Newest => "newest",
            GameSort::Title => "title",
        }
    }
}
