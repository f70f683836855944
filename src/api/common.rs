//! Common API utilities and shared types

use serde::Deserialize;

/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for public APIs
pub fn default_page_size() -> u32 {
    20
}

/// Pull out-of-range pagination values back in bounds
pub fn clamp_pagination(page: u32, page_size: u32) -> (u32, u32) {
    (page.max(1), page_size.clamp(1, MAX_PAGE_SIZE))
}

/// Basic pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl PaginationQuery {
    /// Page and page size, clamped
    pub fn clamped(&self) -> (u32, u32) {
        clamp_pagination(self.page, self.page_size)
    }
}
