//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{FixedOffset, Offset, Utc};

/// Calculate pagination offset for a 1-based page number
pub fn calculate_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

/// Number of pages needed to hold `total_items`
pub fn total_pages(total_items: i64, page_size: u32) -> u32 {
    if page_size == 0 || total_items <= 0 {
        return 0;
    }
    let size = i64::from(page_size);
    ((total_items + size - 1) / size) as u32
}

/// Build an `ILIKE` pattern matching `needle` as a literal substring
pub fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_");
    format!("%{}%", escaped)
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a fixed offset from minutes east of UTC, falling back to UTC
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_math() {
        assert_eq!(calculate_offset(1, 20), 0);
        assert_eq!(calculate_offset(3, 20), 40);
        assert_eq!(calculate_offset(0, 20), 0);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ann"), "%ann%");
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Week   3 \t lab "), "Week 3 lab");
    }

    #[test]
    fn test_offset_from_minutes() {
        assert_eq!(offset_from_minutes(120).local_minus_utc(), 7200);
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }
}
