use serde::{Deserialize, Serialize};

use crate::{crypto::Hash, time::TimestampMillis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ordering {
    Ascending,
    Descending,
}

impl Default for Ordering {
    fn default() -> Self {
        // Default ordering is ascending block position, spec §4.7.
        Ordering::Ascending
    }
}

/// Pagination metadata carried by every paged query, spec §4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page_size: u32,
    pub first_hash: Option<Hash>,
    pub ordering: Option<Ordering>,
    pub first_tx_time: Option<TimestampMillis>,
    pub last_tx_time: Option<TimestampMillis>,
    pub first_tx_height: Option<u64>,
    pub last_tx_height: Option<u64>,
}

impl PaginationMeta {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            first_hash: None,
            ordering: None,
            first_tx_time: None,
            last_tx_time: None,
            first_tx_height: None,
            last_tx_height: None,
        }
    }

    pub fn effective_page_size(&self) -> u32 {
        self.page_size
            .clamp(1, crate::config::MAX_QUERY_PAGE_SIZE)
    }
}

impl Default for PaginationMeta {
    fn default() -> Self {
        Self::with_page_size(crate::config::DEFAULT_QUERY_PAGE_SIZE)
    }
}

/// `{items, total_count, next_hash?}`, spec §4.7. `next_hash` is set iff more
/// items follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub next_hash: Option<Hash>,
}

impl<T> PaginationResponse<T> {
    pub fn new(items: Vec<T>, total_count: u64, next_hash: Option<Hash>) -> Self {
        Self { items, total_count, next_hash }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped_to_the_configured_maximum() {
        let meta = PaginationMeta::with_page_size(u32::MAX);
        assert_eq!(meta.effective_page_size(), crate::config::MAX_QUERY_PAGE_SIZE);
    }

    #[test]
    fn page_size_zero_is_clamped_up_to_one() {
        let meta = PaginationMeta::with_page_size(0);
        assert_eq!(meta.effective_page_size(), 1);
    }

    #[test]
    fn default_ordering_is_ascending() {
        assert_eq!(Ordering::default(), Ordering::Ascending);
    }
}
