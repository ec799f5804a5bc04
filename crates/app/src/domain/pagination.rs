//! Pagination

use crate::validation::{FieldError, ValidationErrors};

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Build from optional raw query values.
    ///
    /// # Errors
    ///
    /// Returns field errors for a page below 1 or a page size outside
    /// `1..=100`.
    pub fn from_query(page: Option<i64>, per_page: Option<i64>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let page = errors.check(match page {
            None => Ok(1),
            Some(page) => u32::try_from(page)
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| FieldError::new("page", "must be at least 1")),
        });

        let per_page = errors.check(match per_page {
            None => Ok(DEFAULT_PER_PAGE),
            Some(per_page) => u32::try_from(per_page)
                .ok()
                .filter(|per_page| (1..=MAX_PER_PAGE).contains(per_page))
                .ok_or_else(|| {
                    FieldError::new("per_page", format!("must be between 1 and {MAX_PER_PAGE}"))
                }),
        });

        errors.into_result()?;

        Ok(Self { page, per_page })
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        }
    }

    /// Index of the last page; 1 for an empty result.
    #[must_use]
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page)).max(1)
    }
}
