//! Offset pagination shared by the listing operations.

use serde::Serialize;

const DEFAULT_PAGE_SIZE: u32 = 24;
const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request. Out-of-range values are clamped rather than
/// rejected so that a mangled query string degrades to a sane listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// First page with the given size; used by the unpaginated rails.
    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Pagination metadata attached to every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_games: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

impl Pagination {
    pub fn compute(page: PageRequest, total_games: u64) -> Self {
        let per_page = u64::from(page.per_page());
        let total_pages = total_games.div_ceil(per_page).min(u64::from(u32::MAX)) as u32;
        Self {
            current_page: page.page(),
            total_games,
            total_pages,
            has_more: u64::from(page.page()) * per_page < total_games,
        }
    }

    pub fn empty(page: PageRequest) -> Self {
        Self::compute(page, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_of_total_over_page_size() {
        let pagination = Pagination::compute(PageRequest::new(1, 2), 5);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_games, 5);
        assert!(pagination.has_more);
    }

    #[test]
    fn has_more_is_false_on_the_last_page() {
        let pagination = Pagination::compute(PageRequest::new(3, 2), 5);
        assert_eq!(pagination.current_page, 3);
        assert!(!pagination.has_more);

        let exact = Pagination::compute(PageRequest::new(2, 5), 10);
        assert!(!exact.has_more);
        assert_eq!(exact.total_pages, 2);
    }

    #[test]
    fn empty_listing_has_zero_pages() {
        let pagination = Pagination::empty(PageRequest::new(1, 24));
        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.total_games, 0);
        assert!(!pagination.has_more);
    }

    #[test]
    fn page_and_size_are_clamped() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), 1);
        assert_eq!(PageRequest::new(2, 500).per_page(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 24).offset(), 0);
        assert_eq!(PageRequest::new(3, 24).offset(), 48);
    }
}
