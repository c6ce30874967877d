//! Paginated response envelope

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// One page of a list endpoint, as produced by the backend's pager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    /// Zero-based page index
    pub number: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: u32,
}

impl<T> Page<T> {
    /// Build a page from a slice of a larger, already-sorted result set
    pub fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64) as u32
        };
        let number_of_elements = content.len() as u32;
        Self {
            content,
            total_elements,
            total_pages,
            size,
            number,
            first: number == 0,
            last: total_pages == 0 || number + 1 >= total_pages,
            number_of_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        !self.last
    }

    pub fn has_previous(&self) -> bool {
        !self.first
    }

    /// An empty page requested beyond the last one. The backend answers this
    /// way when rows were deleted after the page index was chosen.
    pub fn is_past_end(&self) -> bool {
        self.content.is_empty() && self.number > 0 && self.number >= self.total_pages && self.last
    }

    /// Check the envelope invariants the views rely on
    pub fn check_invariants(&self) -> ApiResult<()> {
        let fail = |msg: String| Err(ApiError::Decode(format!("malformed page: {}", msg)));

        if self.content.len() != self.number_of_elements as usize {
            return fail(format!(
                "content has {} elements but numberOfElements is {}",
                self.content.len(),
                self.number_of_elements
            ));
        }
        if self.number_of_elements > self.size {
            return fail(format!(
                "{} elements exceed page size {}",
                self.number_of_elements, self.size
            ));
        }
        if self.first != (self.number == 0) {
            return fail(format!("first={} on page {}", self.first, self.number));
        }
        if self.is_past_end() {
            return Ok(());
        }

        if self.total_pages == 0 {
            if self.number != 0 || !self.content.is_empty() || !self.last {
                return fail("empty result must be a single last page".to_string());
            }
            return Ok(());
        }

        if self.number >= self.total_pages {
            return fail(format!(
                "page {} out of range for {} pages",
                self.number, self.total_pages
            ));
        }
        if self.last != (self.number == self.total_pages - 1) {
            return fail(format!(
                "last={} on page {} of {}",
                self.last, self.number, self.total_pages
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_page_shape() {
        let page = Page::new((0..10).collect::<Vec<_>>(), 0, 10, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.first);
        assert!(!page.last);
        assert!(page.check_invariants().is_ok());

        let page = Page::new((20..25).collect::<Vec<_>>(), 2, 10, 25);
        assert!(page.last);
        assert!(!page.has_next());
        assert!(page.has_previous());
        assert!(page.check_invariants().is_ok());
    }

    #[test]
    fn test_empty_page_is_valid() {
        let page: Page<u32> = Page::new(vec![], 0, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first && page.last);
        assert!(page.check_invariants().is_ok());
    }

    #[test]
    fn test_parse_spring_page() {
        let page: Page<u32> = serde_json::from_value(json!({
            "content": [1, 2],
            "pageable": { "pageNumber": 1, "pageSize": 2 },
            "totalElements": 4,
            "totalPages": 2,
            "size": 2,
            "number": 1,
            "first": false,
            "last": true,
            "numberOfElements": 2,
            "empty": false
        }))
        .unwrap();
        assert!(page.check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_violations() {
        let mut page = Page::new(vec![1, 2, 3], 0, 3, 9);
        page.number_of_elements = 2;
        assert!(matches!(page.check_invariants(), Err(ApiError::Decode(_))));

        let mut page = Page::new(vec![1, 2, 3], 0, 3, 9);
        page.first = false;
        assert!(page.check_invariants().is_err());

        let mut page = Page::new(vec![1, 2, 3], 2, 3, 9);
        page.last = false;
        assert!(page.check_invariants().is_err());

        let page = Page::new(vec![1, 2, 3], 0, 2, 9);
        assert!(page.check_invariants().is_err());

        let page = Page::new(vec![1], 5, 10, 20);
        assert!(page.check_invariants().is_err());

        let mut page: Page<u32> = Page::new(vec![], 5, 10, 20);
        page.last = false;
        assert!(page.check_invariants().is_err());
    }

    #[test]
    fn test_past_end_page_is_accepted() {
        // Page 2 of a list that shrank from 21 to 20 rows
        let page: Page<u32> = serde_json::from_value(json!({
            "content": [],
            "totalElements": 20,
            "totalPages": 2,
            "size": 10,
            "number": 2,
            "first": false,
            "last": true,
            "numberOfElements": 0,
            "empty": true
        }))
        .unwrap();
        assert!(page.is_past_end());
        assert!(page.check_invariants().is_ok());

        // Everything deleted while sitting on page 3
        let page: Page<u32> = Page::new(vec![], 3, 10, 0);
        assert!(page.is_past_end());
        assert!(page.check_invariants().is_ok());

        assert!(!Page::<u32>::new(vec![], 0, 10, 0).is_past_end());
        assert!(!Page::new(vec![1, 2], 1, 10, 12).is_past_end());
    }
}
