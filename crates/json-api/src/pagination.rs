//! Paging metadata shared by the listing endpoints.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

use bazaar_app::domain::pagination::Page;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PageMeta {
    /// Matching rows across every page
    pub total: u64,

    /// Current page, starting at 1
    pub page: u32,

    pub per_page: u32,

    /// Last page index; 1 when nothing matched
    pub last_page: u64,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        Self {
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            last_page: page.last_page(),
        }
    }
}
