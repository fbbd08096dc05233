//! Cache keys and invalidation tags.
//!
//! A cache key deterministically encodes an operation name and every
//! parameter that affects its result. Parameters are canonicalized (sorted
//! by name, separator characters escaped) so two logically equal queries
//! always map to the same entry regardless of the order the call site
//! supplied them in, and any differing parameter produces a different key.

use std::fmt;

use serde::Serialize;

/// Coarse invalidation domain. Every cache entry whose value depends on a
/// dataset, even indirectly, registers under that dataset's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheTag {
    Languages,
    Categories,
    Tags,
    Games,
}

impl CacheTag {
    pub const ALL: [CacheTag; 4] = [
        CacheTag::Languages,
        CacheTag::Categories,
        CacheTag::Tags,
        CacheTag::Games,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Languages => "languages",
            CacheTag::Categories => "categories",
            CacheTag::Tags => "tags",
            CacheTag::Games => "games",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one cache entry: operation name plus canonical parameter string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    params: String,
}

impl CacheKey {
    /// Key for an operation without parameters.
    pub fn bare(operation: &'static str) -> Self {
        Self {
            operation,
            params: String::new(),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.operation)
        } else {
            write!(f, "{}?{}", self.operation, self.params)
        }
    }
}

/// Builds a [`CacheKey`] from named parameters.
#[derive(Debug, Default)]
pub struct KeyBuilder {
    pairs: Vec<(&'static str, String)>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one parameter. Values are escaped so they cannot collide with
    /// the pair separators.
    pub fn push(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.pairs.push((name, escape(&value.to_string())));
        self
    }

    /// Record an optional parameter; `None` contributes no pair, which keeps
    /// it distinct from an empty value.
    pub fn push_opt(self, name: &'static str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.push(name, value),
            None => self,
        }
    }

    pub fn build(mut self, operation: &'static str) -> CacheKey {
        self.pairs.sort_by(|a, b| a.0.cmp(b.0));
        let params = self
            .pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        CacheKey { operation, params }
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3d"),
            other => escaped.push(other),
        }
    }
    escaped
}
