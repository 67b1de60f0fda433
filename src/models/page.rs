use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// One page of a collection, with pagination metadata alongside the items.
///
/// Both list endpoints name the item array `support_requests`, including
/// the lead list. That is how the API emits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub total: u64,
    pub size: u64,
    #[serde(rename = "support_requests")]
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Optional pagination for list requests. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// `(page, page_size)` with defaults filled in.
    pub fn resolved(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(DEFAULT_PAGE),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }

    pub fn query_pairs(&self) -> [(&'static str, u32); 2] {
        let (page, page_size) = self.resolved();
        [("page", page), ("page_size", page_size)]
    }
}

/// Result of deleting a lead or support request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}
