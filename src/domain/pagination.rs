pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub skip: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Builds the page descriptor for `total` matching rows.
    ///
    /// A non-positive `page` is read as the first page and a non-positive
    /// `limit` as [`DEFAULT_PAGE_SIZE`]. `skip` saturates instead of
    /// overflowing for absurd page numbers.
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let current_page = page.max(1);
        let limit = if limit > 0 { limit } else { DEFAULT_PAGE_SIZE };
        let total = total.max(0);
        Self {
            current_page,
            limit,
            skip: (current_page - 1).saturating_mul(limit),
            total,
            total_pages: total / limit + i64::from(total % limit != 0),
        }
    }
}
