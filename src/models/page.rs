//! Pagination types shared by listing queries

use serde::{Deserialize, Serialize};

use crate::utils::helpers::{calculate_offset, total_pages};

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Clamp to `page >= 1` and `1 <= page_size <= max_page_size`
    pub fn normalized(self, max_page_size: u32) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        calculate_offset(self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
        }
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_items, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}
