//! Pure derivations over cached reference data.
//!
//! Every function here takes an already-resolved reference snapshot and
//! returns a narrower structure. None of them touches a repository, so
//! their cost is dominated by the cached snapshot lookup and they are safe
//! to call on every request. Deterministic: the same snapshot always yields
//! the same output.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::views::{BreadcrumbEntry, CategoryLink, CategoryView, TagLinkView, TagView};

/// id → display name, for decorating game rows.
pub fn category_name_by_id(categories: &[CategoryView]) -> HashMap<Uuid, String> {
    categories
        .iter()
        .map(|category| (category.id, category.name.clone()))
        .collect()
}

/// id → {slug, name}, for rendering category links on game cards.
pub fn category_link_by_id(categories: &[CategoryView]) -> HashMap<Uuid, CategoryLink> {
    categories
        .iter()
        .map(|category| {
            (
                category.id,
                CategoryLink {
                    slug: category.slug.clone(),
                    name: category.name.clone(),
                },
            )
        })
        .collect()
}

/// slug → full resolved record, for category landing pages.
pub fn categories_by_slug(categories: &[CategoryView]) -> HashMap<String, CategoryView> {
    categories
        .iter()
        .map(|category| (category.slug.clone(), category.clone()))
        .collect()
}

/// Categories without a parent, in snapshot order.
pub fn main_categories(categories: &[CategoryView]) -> Vec<CategoryView> {
    categories
        .iter()
        .filter(|category| category.is_main())
        .cloned()
        .collect()
}

/// Categories with a parent, in snapshot order.
pub fn sub_categories(categories: &[CategoryView]) -> Vec<CategoryView> {
    categories
        .iter()
        .filter(|category| !category.is_main())
        .cloned()
        .collect()
}

/// Children of the given parent id.
pub fn sub_categories_of(categories: &[CategoryView], parent_id: Uuid) -> Vec<CategoryView> {
    categories
        .iter()
        .filter(|category| category.parent_id == Some(parent_id))
        .cloned()
        .collect()
}

/// Children of the main category with the given slug; empty when the slug
/// is unknown or names a subcategory.
pub fn sub_categories_of_slug(categories: &[CategoryView], parent_slug: &str) -> Vec<CategoryView> {
    let Some(parent) = categories
        .iter()
        .find(|category| category.slug == parent_slug && category.is_main())
    else {
        return Vec::new();
    };
    sub_categories_of(categories, parent.id)
}

/// Breadcrumb trail for a category slug: parent first, then the category
/// itself. Empty when the slug is unknown.
pub fn category_breadcrumb(categories: &[CategoryView], slug: &str) -> Vec<BreadcrumbEntry> {
    let Some(category) = categories.iter().find(|category| category.slug == slug) else {
        return Vec::new();
    };
    let mut trail = Vec::with_capacity(2);
    if let Some(parent_id) = category.parent_id {
        if let Some(parent) = categories.iter().find(|candidate| candidate.id == parent_id) {
            trail.push(BreadcrumbEntry {
                slug: parent.slug.clone(),
                name: parent.name.clone(),
            });
        }
    }
    trail.push(BreadcrumbEntry {
        slug: category.slug.clone(),
        name: category.name.clone(),
    });
    trail
}

/// Top `n` categories by published-game count, count descending then slug
/// for a stable order.
pub fn top_categories(categories: &[CategoryView], n: usize) -> Vec<CategoryView> {
    let mut ranked: Vec<CategoryView> = categories.to_vec();
    ranked.sort_by(|a, b| {
        b.game_count
            .cmp(&a.game_count)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    ranked.truncate(n);
    ranked
}

/// id → display name for tags.
pub fn tag_name_by_id(tags: &[TagView]) -> HashMap<Uuid, String> {
    tags.iter().map(|tag| (tag.id, tag.name.clone())).collect()
}

/// id → {slug, name} for tag links on detail pages.
pub fn tag_link_by_id(tags: &[TagView]) -> HashMap<Uuid, TagLinkView> {
    tags.iter()
        .map(|tag| {
            (
                tag.id,
                TagLinkView {
                    slug: tag.slug.clone(),
                    name: tag.name.clone(),
                },
            )
        })
        .collect()
}

/// slug → full resolved record for tag landing pages.
pub fn tags_by_slug(tags: &[TagView]) -> HashMap<String, TagView> {
    tags.iter()
        .map(|tag| (tag.slug.clone(), tag.clone()))
        .collect()
}

/// Top `n` tags by published-game count.
pub fn top_tags(tags: &[TagView], n: usize) -> Vec<TagView> {
    let mut ranked: Vec<TagView> = tags.to_vec();
    ranked.sort_by(|a, b| {
        b.game_count
            .cmp(&a.game_count)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    ranked.truncate(n);
    ranked
}
