//! Immutable cart snapshots and their transitions.
//!
//! A [`CartState`] never changes after it is built. Every mutation produces a
//! fresh state, so a snapshot handed to a consumer stays valid and unchanged
//! no matter what happens to the cart afterwards. Clones are cheap (`Arc`).

use std::sync::Arc;

use go_marketplace_core::{CartItem, NewCartItem};
use rust_decimal::Decimal;

use crate::policy::{DecrementPolicy, DuplicatePolicy};

/// Ordered cart contents. Insertion order is append order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartState {
    items: Arc<[CartItem]>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The cart lines, in order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of lines (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First line for the given product ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items
            .iter()
            .fold(0_i64, |total, item| total.saturating_add(item.quantity))
    }

    /// Sum of `price * quantity` over all lines, saturating at the bounds of
    /// [`Decimal`].
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Copy the lines out into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<CartItem> {
        self.items.to_vec()
    }

    /// Whether two snapshots share the same backing storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    /// State with `item` added at quantity one.
    ///
    /// Under [`DuplicatePolicy::Append`] a new line is always appended, even if
    /// the product is already present. Under [`DuplicatePolicy::MergeQuantity`]
    /// an existing line is incremented instead.
    #[must_use]
    pub fn with_added(&self, item: NewCartItem, policy: DuplicatePolicy) -> Self {
        if policy == DuplicatePolicy::MergeQuantity && self.contains(item.id.as_str()) {
            return self.with_incremented(item.id.as_str());
        }

        let mut items = self.items.to_vec();
        items.push(item.with_quantity(1));
        Self::from(items)
    }

    /// State with every line for `id` incremented by one.
    ///
    /// Unknown IDs leave the contents unchanged.
    #[must_use]
    pub fn with_incremented(&self, id: &str) -> Self {
        self.map_matching(id, |quantity| Some(quantity.saturating_add(1)))
    }

    /// State with every line for `id` decremented by one, per `policy`.
    ///
    /// Unknown IDs leave the contents unchanged.
    #[must_use]
    pub fn with_decremented(&self, id: &str, policy: DecrementPolicy) -> Self {
        self.map_matching(id, |quantity| {
            let next = quantity.saturating_sub(1);
            match policy {
                DecrementPolicy::Unclamped => Some(next),
                DecrementPolicy::ClampAtZero => Some(next.max(0)),
                DecrementPolicy::RemoveAtZero => (next > 0).then_some(next),
            }
        })
    }

    /// Rebuild the sequence, applying `update` to the quantity of matching
    /// lines. `None` drops the line.
    fn map_matching(&self, id: &str, update: impl Fn(i64) -> Option<i64>) -> Self {
        let items: Vec<CartItem> = self
            .items
            .iter()
            .filter_map(|item| {
                if item.id != id {
                    return Some(item.clone());
                }
                update(item.quantity).map(|quantity| CartItem {
                    quantity,
                    ..item.clone()
                })
            })
            .collect();
        Self::from(items)
    }
}

impl From<Vec<CartItem>> for CartState {
    fn from(items: Vec<CartItem>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl FromIterator<CartItem> for CartState {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use go_marketplace_core::Price;

    use super::*;

    fn shirt() -> NewCartItem {
        NewCartItem::new("p1", "Shirt", "u", 10)
    }

    fn mug() -> NewCartItem {
        NewCartItem::new("p2", "Mug", "m", "4.50".parse::<Price>().unwrap())
    }

    fn cart(lines: &[(NewCartItem, i64)]) -> CartState {
        lines
            .iter()
            .map(|(item, quantity)| item.clone().with_quantity(*quantity))
            .collect()
    }

    #[test]
    fn test_add_to_empty() {
        let state = CartState::empty().with_added(shirt(), DuplicatePolicy::Append);
        assert_eq!(state.items(), &[shirt().with_quantity(1)]);
    }

    #[test]
    fn test_add_appends_at_end() {
        let state = cart(&[(shirt(), 2)]).with_added(mug(), DuplicatePolicy::Append);
        assert_eq!(state.len(), 2);
        assert_eq!(state.items()[1], mug().with_quantity(1));
    }

    #[test]
    fn test_add_duplicate_appends_under_default_policy() {
        let before = cart(&[(shirt(), 1)]);
        let after = before.with_added(shirt(), DuplicatePolicy::Append);
        assert_eq!(after.len(), before.len() + 1);
        assert!(after.iter().all(|item| item.id == "p1" && item.quantity == 1));
    }

    #[test]
    fn test_add_duplicate_merges_when_configured() {
        let state = cart(&[(shirt(), 1), (mug(), 1)]).with_added(shirt(), DuplicatePolicy::MergeQuantity);
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("p1").unwrap().quantity, 2);
        assert_eq!(state.get("p2").unwrap().quantity, 1);
    }

    #[test]
    fn test_increment_existing() {
        let state = cart(&[(shirt(), 1)]).with_incremented("p1");
        assert_eq!(state.items(), &[shirt().with_quantity(2)]);
    }

    #[test]
    fn test_increment_preserves_other_lines_and_order() {
        let state = cart(&[(mug(), 5), (shirt(), 1)]).with_incremented("p1");
        assert_eq!(state.items(), &[mug().with_quantity(5), shirt().with_quantity(2)]);
    }

    #[test]
    fn test_increment_touches_every_duplicate() {
        let state = cart(&[(shirt(), 1), (shirt(), 3)]).with_incremented("p1");
        assert_eq!(state.items(), &[shirt().with_quantity(2), shirt().with_quantity(4)]);
    }

    #[test]
    fn test_increment_missing_is_noop() {
        assert!(CartState::empty().with_incremented("missing").is_empty());

        let before = cart(&[(shirt(), 1)]);
        assert_eq!(before.with_incremented("missing"), before);
    }

    #[test]
    fn test_decrement_unclamped_goes_negative() {
        let once = cart(&[(shirt(), 1)]).with_decremented("p1", DecrementPolicy::Unclamped);
        assert_eq!(once.items(), &[shirt().with_quantity(0)]);

        let twice = once.with_decremented("p1", DecrementPolicy::Unclamped);
        assert_eq!(twice.items(), &[shirt().with_quantity(-1)]);
    }

    #[test]
    fn test_decrement_clamped_stops_at_zero() {
        let state = cart(&[(shirt(), 1)])
            .with_decremented("p1", DecrementPolicy::ClampAtZero)
            .with_decremented("p1", DecrementPolicy::ClampAtZero);
        assert_eq!(state.items(), &[shirt().with_quantity(0)]);
    }

    #[test]
    fn test_decrement_remove_drops_line() {
        let state = cart(&[(mug(), 1), (shirt(), 2)])
            .with_decremented("p1", DecrementPolicy::RemoveAtZero);
        assert_eq!(state.get("p1").unwrap().quantity, 1);

        let state = state.with_decremented("p1", DecrementPolicy::RemoveAtZero);
        assert_eq!(state.items(), &[mug().with_quantity(1)]);
    }

    #[test]
    fn test_decrement_missing_is_noop() {
        let before = cart(&[(shirt(), 1)]);
        assert_eq!(before.with_decremented("missing", DecrementPolicy::Unclamped), before);
    }

    #[test]
    fn test_increment_then_decrement_restores_quantity() {
        let before = cart(&[(shirt(), 3), (mug(), 1)]);
        let after = before
            .with_incremented("p2")
            .with_decremented("p2", DecrementPolicy::Unclamped);
        assert_eq!(after, before);
    }

    #[test]
    fn test_transitions_do_not_touch_old_snapshot() {
        let before = cart(&[(shirt(), 1)]);
        let held = before.clone();
        let _after = before.with_incremented("p1").with_added(mug(), DuplicatePolicy::Append);

        assert!(held.ptr_eq(&before));
        assert_eq!(held.items(), &[shirt().with_quantity(1)]);
    }

    #[test]
    fn test_totals() {
        let state = cart(&[(shirt(), 2), (mug(), 3)]);
        assert_eq!(state.item_count(), 5);
        assert_eq!(state.subtotal(), Decimal::new(3350, 2));
        assert_eq!(CartState::empty().subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_saturate() {
        let yacht = NewCartItem::new("max", "Yacht", "y", Price::new(Decimal::MAX));
        let state = cart(&[(yacht.clone(), i64::MAX), (yacht, 2)]);
        assert_eq!(state.item_count(), i64::MAX);
        assert_eq!(state.subtotal(), Decimal::MAX);
    }
}
