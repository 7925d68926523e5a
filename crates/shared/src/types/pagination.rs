//! Pagination types for list endpoints.
//!
//! Every listing operation takes a [`PageRequest`] and answers with a
//! [`PageResult`] that fully describes where the page sits in the result set,
//! so clients never have to re-derive offsets themselves.

use serde::{Deserialize, Serialize};

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page_no")]
    pub page_no: u64,
    /// Number of items per page.
    #[serde(default = "default_item_size")]
    pub item_size: u64,
}

fn default_page_no() -> u64 {
    1
}

fn default_item_size() -> u64 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_no: default_page_no(),
            item_size: default_item_size(),
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping both fields to at least 1.
    #[must_use]
    pub fn new(page_no: u64, item_size: u64) -> Self {
        Self {
            page_no: page_no.max(1),
            item_size: item_size.max(1),
        }
    }
}

/// Where a page sits within the full result set.
///
/// `offset` is `(page - 1) * item_size` clamped to `total_entries`, so it is
/// always a valid offset to hand to the store layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// The page number as requested.
    pub request_page: u64,
    /// The item size as requested.
    pub request_size: u64,
    /// Total entries matching the query across all pages.
    pub total_entries: u64,
    /// Total number of pages (at least 1, even for an empty set).
    pub total_pages: u64,
    /// The effective page, clamped into `1..=total_pages`.
    pub page: u64,
    /// Items per page.
    pub page_size: u64,
    /// The next page number (equals `last_page` when on the last page).
    pub next_page: u64,
    /// The previous page number (equals 1 when on the first page).
    pub previous_page: u64,
    /// Always 1.
    pub first_page: u64,
    /// Equals `total_pages`.
    pub last_page: u64,
    /// Whether the effective page is the first page.
    pub is_first: bool,
    /// Whether the effective page is the last page.
    pub is_last: bool,
    /// Whether a previous page exists.
    pub have_previous: bool,
    /// Whether a next page exists.
    pub have_next: bool,
    /// Row offset of the first item on the effective page.
    pub offset: u64,
}

impl PageResult {
    /// Derives the full pagination description for a request against a result
    /// set of `total_entries` rows.
    #[must_use]
    pub fn for_request(request: PageRequest, total_entries: u64) -> Self {
        let request = PageRequest::new(request.page_no, request.item_size);
        let total_pages = if total_entries == 0 {
            1
        } else {
            total_entries.div_ceil(request.item_size)
        };
        let page = request.page_no.min(total_pages);
        let offset = ((page - 1) * request.item_size).min(total_entries);

        Self {
            request_page: request.page_no,
            request_size: request.item_size,
            total_entries,
            total_pages,
            page,
            page_size: request.item_size,
            next_page: (page + 1).min(total_pages),
            previous_page: page.saturating_sub(1).max(1),
            first_page: 1,
            last_page: total_pages,
            is_first: page == 1,
            is_last: page == total_pages,
            have_previous: page > 1,
            have_next: page < total_pages,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_empty_result_set() {
        let pr = PageResult::for_request(PageRequest::new(1, 10), 0);
        assert_eq!(pr.total_entries, 0);
        assert_eq!(pr.total_pages, 1);
        assert!(pr.is_first);
        assert!(pr.is_last);
        assert!(!pr.have_previous);
        assert!(!pr.have_next);
        assert_eq!(pr.offset, 0);
    }

    #[test]
    fn test_exact_page_boundary() {
        // 20 entries at 10 per page is exactly 2 pages.
        let pr = PageResult::for_request(PageRequest::new(2, 10), 20);
        assert_eq!(pr.total_pages, 2);
        assert_eq!(pr.page, 2);
        assert_eq!(pr.offset, 10);
        assert!(pr.is_last);
        assert!(pr.have_previous);
    }

    #[test]
    fn test_partial_last_page() {
        let pr = PageResult::for_request(PageRequest::new(3, 10), 21);
        assert_eq!(pr.total_pages, 3);
        assert_eq!(pr.offset, 20);
        assert!(pr.is_last);
    }

    #[test]
    fn test_page_beyond_last_clamps() {
        let pr = PageResult::for_request(PageRequest::new(99, 10), 15);
        assert_eq!(pr.page, 2);
        assert_eq!(pr.request_page, 99);
        assert_eq!(pr.offset, 10);
        assert!(pr.is_last);
    }

    #[test]
    fn test_zero_inputs_clamp_to_one() {
        let pr = PageResult::for_request(PageRequest::new(0, 0), 5);
        assert_eq!(pr.page, 1);
        assert_eq!(pr.page_size, 1);
        assert_eq!(pr.total_pages, 5);
    }

    #[test]
    fn test_middle_page_navigation() {
        let pr = PageResult::for_request(PageRequest::new(2, 5), 12);
        assert_eq!(pr.previous_page, 1);
        assert_eq!(pr.next_page, 3);
        assert!(pr.have_previous);
        assert!(pr.have_next);
        assert!(!pr.is_first);
        assert!(!pr.is_last);
    }

    proptest! {
        /// The derived offset never exceeds the total entry count, and the
        /// effective page always lands inside `1..=total_pages`.
        #[test]
        fn prop_offset_and_page_in_bounds(
            page_no in 0u64..1000,
            item_size in 0u64..1000,
            total in 0u64..100_000,
        ) {
            let pr = PageResult::for_request(PageRequest { page_no, item_size }, total);
            prop_assert!(pr.offset <= pr.total_entries);
            prop_assert!(pr.page >= 1);
            prop_assert!(pr.page <= pr.total_pages);
            prop_assert!(pr.total_pages >= 1);
        }

        /// Page navigation fields are internally consistent.
        #[test]
        fn prop_navigation_consistent(
            page_no in 1u64..100,
            item_size in 1u64..100,
            total in 0u64..10_000,
        ) {
            let pr = PageResult::for_request(PageRequest { page_no, item_size }, total);
            prop_assert_eq!(pr.is_first, pr.page == 1);
            prop_assert_eq!(pr.is_last, pr.page == pr.total_pages);
            prop_assert_eq!(pr.have_previous, !pr.is_first);
            prop_assert_eq!(pr.have_next, !pr.is_last);
            prop_assert!(pr.next_page <= pr.total_pages);
            prop_assert!(pr.previous_page >= 1);
        }
    }
}
