//! Pagination primitives
//!
//! Page-number pagination shared by list endpoints.

use serde::Serialize;

/// Requested page (1-based), already clamped to sane bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a request from optional query values
    ///
    /// Missing or zero `page` becomes 1; missing `page_size` becomes
    /// `default_size`; sizes are clamped to `1..=max_size`.
    pub fn new(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let page_size = page_size.unwrap_or(default_size).clamp(1, max_size.max(1));
        Self { page, page_size }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// SQL `LIMIT`
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        let size = u64::from(request.page_size());
        let total_pages = count.div_ceil(size) as u32;
        Self {
            count,
            page: request.page(),
            page_size: request.page_size(),
            total_pages,
            results,
        }
    }

    /// Transform every item, keeping the totals
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let req = PageRequest::new(None, None, 12, 100);
        assert_eq!((req.page(), req.page_size()), (1, 12));

        let req = PageRequest::new(Some(0), Some(0), 12, 100);
        assert_eq!((req.page(), req.page_size()), (1, 1));

        let req = PageRequest::new(Some(3), Some(500), 12, 100);
        assert_eq!((req.page(), req.page_size()), (3, 100));
    }

    #[test]
    fn test_offset() {
        let req = PageRequest::new(Some(3), Some(10), 12, 100);
        assert_eq!(req.limit(), 10);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(Some(1), Some(10), 12, 100);
        assert_eq!(Page::new(Vec::<u8>::new(), 0, req).total_pages, 0);
        assert_eq!(Page::new(Vec::<u8>::new(), 10, req).total_pages, 1);
        assert_eq!(Page::new(Vec::<u8>::new(), 11, req).total_pages, 2);
    }

    #[test]
    fn test_map_keeps_totals() {
        let req = PageRequest::new(Some(2), Some(2), 12, 100);
        let page = Page::new(vec![1, 2], 5, req).map(|n| n * 10);
        assert_eq!(page.results, vec![10, 20]);
        assert_eq!(page.count, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
    }
}
