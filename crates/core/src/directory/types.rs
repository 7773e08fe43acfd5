//! Shared pagination state for the directory views.

/// Forward/backward pagination cursor.
///
/// The service's total counts are not trusted for paging decisions; a full
/// page ("items returned equals page size") is the only signal that more
/// may exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl PageCursor {
    /// Cursor at the first page, nothing loaded yet.
    pub fn first(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            has_more: false,
        }
    }

    /// Record the outcome of a page load.
    ///
    /// `returned` is the raw item count from the server, before any local
    /// filtering, so exclusions don't hide the existence of further pages.
    pub fn observe(&mut self, page: u32, returned: usize) {
        self.page = page;
        self.has_more = returned as u32 == self.page_size;
    }

    /// Page to load when advancing, if a next page may exist.
    pub fn next(&self) -> Option<u32> {
        self.has_more.then(|| self.page + 1)
    }

    /// Page to load when going back, if not on the first page.
    pub fn prev(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_page_means_more() {
        let mut cursor = PageCursor::first(10);
        cursor.observe(1, 10);
        assert!(cursor.has_more);
        assert_eq!(cursor.next(), Some(2));
    }

    #[test]
    fn test_short_page_means_no_more() {
        let mut cursor = PageCursor::first(10);
        cursor.observe(3, 4);
        assert!(!cursor.has_more);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.prev(), Some(2));
    }

    #[test]
    fn test_first_page_has_no_prev() {
        let cursor = PageCursor::first(10);
        assert_eq!(cursor.prev(), None);
    }
}
