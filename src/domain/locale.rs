//! Locale fallback resolution for display fields.
//!
//! A display field resolves to the requested locale's translation when one
//! exists and is non-empty, otherwise to the base-locale value carried on
//! the record itself, ultimately to the empty string. Resolution is total:
//! it never fails and never produces a missing value, so absent translations
//! degrade silently instead of surfacing as errors.

/// Fallback base locale when none is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Resolves display fields for one requested locale against a base locale.
///
/// The field to resolve is designated by two accessors: one returning the
/// locale of a translation row and one returning the (optional) field value.
/// Runs once per field per entity per resolution pass, so it stays
/// allocation-light: the only allocation is the returned `String`.
#[derive(Debug, Clone, Copy)]
pub struct LocaleFallback<'a> {
    requested: &'a str,
    base: &'a str,
}

impl<'a> LocaleFallback<'a> {
    pub fn new(requested: &'a str, base: &'a str) -> Self {
        Self { requested, base }
    }

    /// Resolver against the built-in default locale.
    pub fn with_default_base(requested: &'a str) -> Self {
        Self::new(requested, DEFAULT_LOCALE)
    }

    pub fn requested(&self) -> &str {
        self.requested
    }

    /// True when the requested locale is the base locale, in which case no
    /// translation lookup happens at all.
    pub fn is_base(&self) -> bool {
        self.requested == self.base
    }

    /// Resolve a required display field.
    ///
    /// `translations` must already be filtered to the entity being resolved.
    /// An empty translated value counts as absent.
    pub fn field<T>(
        &self,
        translations: &[T],
        locale_of: impl Fn(&T) -> &str,
        value_of: impl Fn(&T) -> Option<&str>,
        base_value: &str,
    ) -> String {
        if self.is_base() {
            return base_value.to_string();
        }
        translations
            .iter()
            .find(|row| locale_of(row) == self.requested)
            .and_then(|row| value_of(row))
            .filter(|value| !value.is_empty())
            .unwrap_or(base_value)
            .to_string()
    }

    /// Resolve an optional display field (SEO metadata and the like), where
    /// the base value itself may be absent.
    pub fn optional_field<T>(
        &self,
        translations: &[T],
        locale_of: impl Fn(&T) -> &str,
        value_of: impl Fn(&T) -> Option<&str>,
        base_value: Option<&str>,
    ) -> Option<String> {
        if self.is_base() {
            return base_value
                .filter(|value| !value.is_empty())
                .map(str::to_string);
        }
        translations
            .iter()
            .find(|row| locale_of(row) == self.requested)
            .and_then(|row| value_of(row))
            .filter(|value| !value.is_empty())
            .or(base_value.filter(|value| !value.is_empty()))
            .map(str::to_string)
    }
}
