//! Offset pagination helpers shared by the content API and the blog reader.

use serde::Serialize;

pub const DEFAULT_API_LIMIT: u32 = 50;
pub const MAX_API_LIMIT: u32 = 100;
pub const BLOG_PAGE_SIZE: u32 = 9;

/// Offset-based pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Normalise API query parameters: the limit is clamped to `1..=100`
    /// and defaults to 50, the offset defaults to zero.
    pub fn from_api(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = limit
            .map(|value| value.clamp(1, i64::from(MAX_API_LIMIT)) as u32)
            .unwrap_or(DEFAULT_API_LIMIT);
        let offset = offset.map(|value| value.max(0) as u64).unwrap_or(0);
        Self { limit, offset }
    }

    /// One-based page number for the public blog; values below one clamp to one.
    pub fn for_page(page: i64, per_page: u32) -> Self {
        let page = page.max(1) as u64;
        Self {
            limit: per_page,
            offset: (page - 1).saturating_mul(u64::from(per_page)),
        }
    }
}

/// Page of records plus the total size of the filtered collection.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> OffsetPage<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Number of pages needed for `total` items, at least one.
pub fn page_count(total: u64, per_page: u32) -> u64 {
    if per_page == 0 {
        return 1;
    }
    total.div_ceil(u64::from(per_page)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_limits_are_clamped() {
        assert_eq!(PageRequest::from_api(None, None), PageRequest::new(50, 0));
        assert_eq!(PageRequest::from_api(Some(500), None).limit, 100);
        assert_eq!(PageRequest::from_api(Some(0), None).limit, 1);
        assert_eq!(PageRequest::from_api(Some(-3), Some(-10)), PageRequest::new(1, 0));
        assert_eq!(PageRequest::from_api(Some(20), Some(40)).offset, 40);
    }

    #[test]
    fn blog_pages_start_at_one() {
        assert_eq!(PageRequest::for_page(0, 9), PageRequest::new(9, 0));
        assert_eq!(PageRequest::for_page(-4, 9), PageRequest::new(9, 0));
        assert_eq!(PageRequest::for_page(3, 9), PageRequest::new(9, 18));
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 9), 1);
        assert_eq!(page_count(9, 9), 1);
        assert_eq!(page_count(10, 9), 2);
        assert_eq!(page_count(27, 9), 3);
    }
}
