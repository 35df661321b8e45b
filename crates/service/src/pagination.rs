//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Slice an already-ordered list into the requested page.
    pub fn apply<T>(self, items: Vec<T>) -> Page<T> {
        let (idx, per) = self.normalize();
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip((idx * per) as usize)
            .take(per as usize)
            .collect();
        Page { count, page: idx + 1, per_page: per, results }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: default_page(), per_page: default_per_page() } }
}

/// One page of results plus the total count before paging.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub per_page: u64,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::default();
        assert_eq!(d.page, 1);
        assert_eq!(d.per_page, 20);
    }

    #[test]
    fn apply_slices_and_keeps_total() {
        let page = Pagination { page: 2, per_page: 3 }.apply((1..=7).collect::<Vec<_>>());
        assert_eq!(page.count, 7);
        assert_eq!(page.page, 2);
        assert_eq!(page.results, vec![4, 5, 6]);

        let past_end = Pagination { page: 9, per_page: 3 }.apply(vec![1, 2]);
        assert!(past_end.results.is_empty());
        assert_eq!(past_end.count, 2);
    }
}
