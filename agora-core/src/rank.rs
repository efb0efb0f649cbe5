//! Ranking and pagination
//!
//! The ranking function is pure: given a sort mode and a collection of
//! scored items it produces an ordered sequence. Storage-side listings use
//! `ORDER BY` clauses that mirror these comparators exactly; in-memory
//! consumers (search results, tests) call [`order`] directly.
//!
//! Ties are broken by id descending. Ids are UUIDv7 and therefore
//! timestamp-sortable, so the tie-break is deterministic and stable across
//! requests.

use crate::error::PageError;
use crate::{Comment, EntityId, Post, SortMode, Timestamp};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// PAGE SIZES
// ============================================================================

/// Page size for post and user listings.
pub const POSTS_PER_PAGE: u32 = 20;
/// Page size for comment listings.
pub const COMMENTS_PER_PAGE: u32 = 10;

// ============================================================================
// RANKABLE ITEMS
// ============================================================================

/// An item that can be ordered by the ranking function.
pub trait Rankable {
    fn id(&self) -> EntityId;
    fn created_at(&self) -> Timestamp;
    fn upvotes(&self) -> i32;
    fn downvotes(&self) -> i32;

    /// Net score, what `hot` orders by.
    fn net_score(&self) -> i32 {
        self.upvotes() - self.downvotes()
    }
}

impl Rankable for Post {
    fn id(&self) -> EntityId {
        self.post_id
    }
    fn created_at(&self) -> Timestamp {
        self.created_at
    }
    fn upvotes(&self) -> i32 {
        self.upvotes
    }
    fn downvotes(&self) -> i32 {
        self.downvotes
    }
}

impl Rankable for Comment {
    fn id(&self) -> EntityId {
        self.comment_id
    }
    fn created_at(&self) -> Timestamp {
        self.created_at
    }
    fn upvotes(&self) -> i32 {
        self.upvotes
    }
    fn downvotes(&self) -> i32 {
        self.downvotes
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Compare two items under the given sort mode, descending on the primary
/// key with the id tie-break. Suitable for `sort_by` directly.
pub fn compare<T: Rankable>(mode: SortMode, a: &T, b: &T) -> Ordering {
    let primary = match mode {
        SortMode::New => b.created_at().cmp(&a.created_at()),
        SortMode::Top => b.upvotes().cmp(&a.upvotes()),
        SortMode::Hot => b.net_score().cmp(&a.net_score()),
    };
    primary.then_with(|| b.id().cmp(&a.id()))
}

/// Order a collection in place under the given sort mode.
pub fn order<T: Rankable>(mode: SortMode, items: &mut [T]) {
    items.sort_by(|a, b| compare(mode, a, b));
}

// ============================================================================
// PAGINATION
// ============================================================================

/// One page of a ranked listing, with totals reported alongside.
/// Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    /// Total item count before pagination.
    pub total: i64,
    /// Total page count; 1 when the listing is empty.
    pub pages: i64,
}

impl<T> Paginated<T> {
    /// Assemble a page from an already-windowed item slice and the total
    /// item count.
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
            pages: page_count(total, per_page),
        }
    }

    /// Map the item type while preserving the page envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// Total number of pages for `total` items at `per_page`. Empty listings
/// still have one (empty) page.
pub fn page_count(total: i64, per_page: u32) -> i64 {
    let per_page = i64::from(per_page.max(1));
    ((total.max(0) + per_page - 1) / per_page).max(1)
}

/// Validate a 1-indexed page number and convert it to a row offset.
pub fn page_offset(page: u32, per_page: u32) -> Result<i64, PageError> {
    if page == 0 {
        return Err(PageError::ZeroPage(page));
    }
    Ok(i64::from(page - 1) * i64::from(per_page))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_entity_id;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: EntityId,
        created_at: Timestamp,
        upvotes: i32,
        downvotes: i32,
    }

    impl Rankable for Item {
        fn id(&self) -> EntityId {
            self.id
        }
        fn created_at(&self) -> Timestamp {
            self.created_at
        }
        fn upvotes(&self) -> i32 {
            self.upvotes
        }
        fn downvotes(&self) -> i32 {
            self.downvotes
        }
    }

    fn item(day: u32, upvotes: i32, downvotes: i32) -> Item {
        Item {
            id: new_entity_id(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            upvotes,
            downvotes,
        }
    }

    #[test]
    fn test_new_orders_by_creation_desc() {
        let mut items = vec![item(1, 0, 0), item(3, 0, 0), item(2, 0, 0)];
        order(SortMode::New, &mut items);
        let days: Vec<u32> = items
            .iter()
            .map(|i| {
                use chrono::Datelike;
                i.created_at.day()
            })
            .collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    #[test]
    fn test_top_orders_by_upvotes_desc() {
        let mut items = vec![item(1, 2, 9), item(1, 7, 0), item(1, 5, 1)];
        order(SortMode::Top, &mut items);
        let ups: Vec<i32> = items.iter().map(|i| i.upvotes).collect();
        assert_eq!(ups, vec![7, 5, 2]);
    }

    #[test]
    fn test_hot_orders_by_net_score_desc() {
        // Top would put the (9, 8) item first; hot must not.
        let mut items = vec![item(1, 9, 8), item(1, 4, 0), item(1, 3, 1)];
        order(SortMode::Hot, &mut items);
        let nets: Vec<i32> = items.iter().map(|i| i.upvotes - i.downvotes).collect();
        assert_eq!(nets, vec![4, 2, 1]);
    }

    #[test]
    fn test_ties_break_by_id_desc() {
        let a = item(1, 5, 0);
        let b = item(1, 5, 0);
        // Later-created id sorts first on a tie.
        let (first, second) = if a.id > b.id { (a, b) } else { (b, a) };
        let mut items = vec![second.clone(), first.clone()];
        order(SortMode::Top, &mut items);
        assert_eq!(items[0].id, first.id);
        assert_eq!(items[1].id, second.id);
    }

    #[test]
    fn test_ordering_is_reproducible() {
        let items = vec![item(2, 3, 1), item(1, 3, 1), item(3, 0, 0), item(4, 9, 9)];
        for mode in [SortMode::New, SortMode::Top, SortMode::Hot] {
            let mut first = items.clone();
            let mut second = items.clone();
            order(mode, &mut first);
            order(mode, &mut second);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 20), 1);
        assert_eq!(page_count(1, 20), 1);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
        assert_eq!(page_count(41, 10), 5);
    }

    #[test]
    fn test_page_offset_is_one_indexed() {
        assert!(page_offset(0, 20).is_err());
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
        assert_eq!(page_offset(2, 10).unwrap(), 10);
    }

    #[test]
    fn test_paginated_envelope() {
        let page = Paginated::new(vec![1, 2, 3], 2, 3, 7);
        assert_eq!(page.pages, 3);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.total, 7);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::new_entity_id;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: EntityId,
        created_at: Timestamp,
        upvotes: i32,
        downvotes: i32,
    }

    impl Rankable for Item {
        fn id(&self) -> EntityId {
            self.id
        }
        fn created_at(&self) -> Timestamp {
            self.created_at
        }
        fn upvotes(&self) -> i32 {
            self.upvotes
        }
        fn downvotes(&self) -> i32 {
            self.downvotes
        }
    }

    fn items_strategy() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((0i64..10_000, 0i32..500, 0i32..500), 0..50).prop_map(|raw| {
            let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            raw.into_iter()
                .map(|(secs, upvotes, downvotes)| Item {
                    id: new_entity_id(),
                    created_at: epoch + Duration::seconds(secs),
                    upvotes,
                    downvotes,
                })
                .collect()
        })
    }

    fn mode_strategy() -> impl Strategy<Value = SortMode> {
        prop_oneof![Just(SortMode::New), Just(SortMode::Top), Just(SortMode::Hot)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// Ranking is a permutation: nothing is dropped or duplicated.
        #[test]
        fn prop_order_is_permutation(mut items in items_strategy(), mode in mode_strategy()) {
            let mut before: Vec<EntityId> = items.iter().map(|i| i.id).collect();
            order(mode, &mut items);
            let mut after: Vec<EntityId> = items.iter().map(|i| i.id).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }

        /// The output is totally ordered under the comparator: every
        /// adjacent pair compares less-or-equal.
        #[test]
        fn prop_output_is_sorted(mut items in items_strategy(), mode in mode_strategy()) {
            order(mode, &mut items);
            for pair in items.windows(2) {
                prop_assert_ne!(compare(mode, &pair[0], &pair[1]), std::cmp::Ordering::Greater);
            }
        }

        /// Determinism: ranking a shuffled copy yields the identical id
        /// sequence — the id tie-break leaves no ambiguity.
        #[test]
        fn prop_order_is_deterministic(items in items_strategy(), mode in mode_strategy()) {
            let mut forward = items.clone();
            let mut reversed: Vec<Item> = items.into_iter().rev().collect();
            order(mode, &mut forward);
            order(mode, &mut reversed);
            let forward_ids: Vec<EntityId> = forward.iter().map(|i| i.id).collect();
            let reversed_ids: Vec<EntityId> = reversed.iter().map(|i| i.id).collect();
            prop_assert_eq!(forward_ids, reversed_ids);
        }

        /// Page arithmetic: offsets tile the listing exactly, and the page
        /// count covers every item.
        #[test]
        fn prop_page_math(total in 0i64..100_000, per_page in 1u32..100) {
            let pages = page_count(total, per_page);
            prop_assert!(pages >= 1);
            prop_assert!(pages * i64::from(per_page) >= total);
            prop_assert!((pages - 1) * i64::from(per_page) < total.max(1));

            let last_offset = page_offset(pages as u32, per_page).unwrap();
            prop_assert!(last_offset < total.max(1));
        }
    }
}
