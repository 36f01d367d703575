//! Pagination of dashboard rows (50 rows/page)

/// Page size constant for all pagination
pub const PAGE_SIZE: usize = 50;

/// Pagination metadata calculated from total rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages
    pub total_pages: usize,
    /// Index of the first row on the page
    pub offset: usize,
}

impl Pagination {
    /// The rows of `items` that fall on this page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = (self.offset + PAGE_SIZE).min(items.len());
        &items[start..end]
    }
}

/// Calculate pagination metadata from total rows and requested page
///
/// The page is clamped to `[1, total_pages]`; an empty result set has zero
/// pages and reports page 1.
///
/// # Examples
/// ```
/// use curate_server::pagination::calculate_pagination;
///
/// // 120 rows = 3 pages (50 + 50 + 20)
/// let p = calculate_pagination(120, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 50);
///
/// // Out-of-bounds page gets clamped
/// let p = calculate_pagination(120, 99);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_rows: usize, requested_page: usize) -> Pagination {
    let total_pages = total_rows.div_ceil(PAGE_SIZE);
    let page = requested_page.clamp(1, total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normal() {
        let p = calculate_pagination(120, 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.offset, 50);
    }

    #[test]
    fn test_pagination_out_of_bounds() {
        let p = calculate_pagination(70, 99);
        assert_eq!(p.page, 2);
        assert_eq!(p.offset, 50);

        let p = calculate_pagination(70, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn test_pagination_empty() {
        let p = calculate_pagination(0, 3);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert!(p.slice::<u8>(&[]).is_empty());
    }

    #[test]
    fn test_slice_last_page_is_partial() {
        let rows: Vec<usize> = (0..120).collect();
        let p = calculate_pagination(rows.len(), 3);
        assert_eq!(p.slice(&rows), &rows[100..120]);
    }

    #[test]
    fn test_pagination_exact_page_boundary() {
        let p = calculate_pagination(100, 2);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.offset, 50);
    }
}
