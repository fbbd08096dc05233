//! Locale-resolved views of catalog records.
//!
//! A view is the merge of a record with its translation for one requested
//! locale. Every display field is resolved, falling back to the base-locale
//! value and ultimately to an empty string, so downstream code never deals
//! with missing names.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub parent_id: Option<Uuid>,
    pub enabled: bool,
    /// Published games under this category (main link for main categories,
    /// direct link for subcategories).
    pub game_count: u64,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
}

impl CategoryView {
    pub fn is_main(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub enabled: bool,
    pub game_count: u64,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageView {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub flag: Option<String>,
    pub is_default: bool,
}

/// Minimal category reference attached to game rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLink {
    pub slug: String,
    pub name: String,
}

/// One step of a category breadcrumb trail (parent first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreadcrumbEntry {
    pub slug: String,
    pub name: String,
}

/// A resolved game row as it appears in listings, decorated with reference
/// display names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameCard {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub category_name: String,
    pub category_slug: String,
    pub tags: Vec<String>,
    pub play_count: i64,
    pub rating: Option<f32>,
}

/// The full resolved game for a detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameDetail {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub embed_url: Option<String>,
    pub category: Option<CategoryLink>,
    pub main_category: Option<CategoryLink>,
    pub tags: Vec<TagLinkView>,
    pub play_count: i64,
    pub rating: Option<f32>,
}

/// Minimal tag reference attached to game detail pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagLinkView {
    pub slug: String,
    pub name: String,
}
