//! Cart and wishlist stores.
//!
//! Both are plain owned values: callers construct them (optionally from a
//! saved snapshot), mutate them synchronously and write a snapshot back when
//! done. Nothing here touches the network or storage directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::PriceLine;
use crate::CoreError;

/// One product in the cart, with its price frozen when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// A line with quantity 1.
    #[must_use]
    pub fn new(product_id: i64, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            unit_price,
            image: None,
            quantity: 1,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    #[must_use]
    pub fn price_line(&self) -> PriceLine {
        PriceLine::new(self.unit_price, self.quantity)
    }
}

/// Shopping cart keyed by product id, in insertion order.
///
/// Invariant: every line has `quantity >= 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from a JSON snapshot produced by [`Cart::snapshot`].
    ///
    /// Lines with a zero quantity are dropped and repeated product ids are
    /// merged, so a hand-edited snapshot cannot break the invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSnapshot`] if the JSON does not parse.
    pub fn restore(snapshot: &str) -> Result<Self, CoreError> {
        let lines: Vec<CartLine> = serde_json::from_str(snapshot)
            .map_err(|e| CoreError::InvalidSnapshot(e.to_string()))?;
        let mut cart = Self::new();
        for line in lines {
            cart.add(line);
        }
        Ok(cart)
    }

    /// Serializes the cart lines to JSON for local persistence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSnapshot`] if serialization fails.
    pub fn snapshot(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.lines).map_err(|e| CoreError::InvalidSnapshot(e.to_string()))
    }

    /// Adds a line. An existing line for the same product has its quantity
    /// increased by `line.quantity`; otherwise the line is appended.
    ///
    /// Returns `false` (and changes nothing) when `line.quantity` is zero.
    pub fn add(&mut self, line: CartLine) -> bool {
        if line.quantity == 0 {
            return false;
        }
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => self.lines.push(line),
        }
        true
    }

    /// Sets the quantity of an existing line.
    ///
    /// Quantities below 1 are rejected: use [`Cart::remove`] to drop a line.
    /// Returns `true` if the quantity was changed.
    pub fn update_quantity(&mut self, product_id: i64, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes the line for `product_id`, returning it if present.
    pub fn remove(&mut self, product_id: i64) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn get(&self, product_id: i64) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn price_lines(&self) -> Vec<PriceLine> {
        self.lines.iter().map(CartLine::price_line).collect()
    }
}

/// Saved-for-later products keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    lines: Vec<CartLine>,
}

impl Wishlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSnapshot`] if the JSON does not parse.
    pub fn restore(snapshot: &str) -> Result<Self, CoreError> {
        let lines: Vec<CartLine> = serde_json::from_str(snapshot)
            .map_err(|e| CoreError::InvalidSnapshot(e.to_string()))?;
        let mut wishlist = Self::new();
        for line in lines {
            wishlist.add(line);
        }
        Ok(wishlist)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSnapshot`] if serialization fails.
    pub fn snapshot(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.lines).map_err(|e| CoreError::InvalidSnapshot(e.to_string()))
    }

    /// Adds a product; adding one that is already saved is a no-op.
    pub fn add(&mut self, line: CartLine) -> bool {
        if self.contains(line.product_id) {
            return false;
        }
        self.lines.push(CartLine {
            quantity: 1,
            ..line
        });
        true
    }

    /// Adds the product if absent, removes it otherwise. Returns whether the
    /// product is saved afterwards.
    pub fn toggle(&mut self, line: CartLine) -> bool {
        if self.remove(line.product_id).is_some() {
            false
        } else {
            self.add(line)
        }
    }

    pub fn remove(&mut self, product_id: i64) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        Some(self.lines.remove(index))
    }

    #[must_use]
    pub fn contains(&self, product_id: i64) -> bool {
        self.lines.iter().any(|l| l.product_id == product_id)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> CartLine {
        CartLine::new(1, "خاتم فضة", Decimal::new(12000, 2)).with_image("/img/ring.jpg")
    }

    fn earrings() -> CartLine {
        CartLine::new(2, "أقراط", Decimal::new(4550, 2))
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let mut cart = Cart::new();
        assert!(cart.add(ring()));
        assert!(cart.add(ring().with_quantity(2)));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(1).map(|l| l.quantity), Some(3));
    }

    #[test]
    fn adding_zero_quantity_is_rejected() {
        let mut cart = Cart::new();
        assert!(!cart.add(ring().with_quantity(0)));
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_to_zero_is_a_no_op() {
        let mut cart = Cart::new();
        cart.add(ring());
        assert!(!cart.update_quantity(1, 0));
        assert_eq!(cart.get(1).map(|l| l.quantity), Some(1));

        assert!(cart.remove(1).is_some());
        assert!(cart.get(1).is_none());
    }

    #[test]
    fn update_quantity_for_missing_product_returns_false() {
        let mut cart = Cart::new();
        assert!(!cart.update_quantity(99, 3));
    }

    #[test]
    fn derived_totals_follow_mutations() {
        let mut cart = Cart::new();
        cart.add(ring());
        cart.add(earrings().with_quantity(2));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total_price(), Decimal::new(21100, 2));

        cart.update_quantity(2, 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_price(), Decimal::new(16550, 2));

        cart.clear();
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn snapshot_restore_preserves_lines_in_order() {
        let mut cart = Cart::new();
        cart.add(earrings());
        cart.add(ring().with_quantity(4));

        let restored = Cart::restore(&cart.snapshot().expect("snapshot")).expect("restore");
        assert_eq!(restored, cart);
        assert_eq!(restored.lines()[0].product_id, 2);
    }

    #[test]
    fn restore_drops_zero_quantities_and_merges_duplicates() {
        let snapshot = r#"[
            {"productId": 1, "name": "a", "unitPrice": "10.00", "image": null, "quantity": 2},
            {"productId": 1, "name": "a", "unitPrice": "10.00", "image": null, "quantity": 1},
            {"productId": 2, "name": "b", "unitPrice": 5, "image": null, "quantity": 0}
        ]"#;
        let cart = Cart::restore(snapshot).expect("restore");
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn restore_rejects_garbage() {
        assert!(matches!(
            Cart::restore("{not json"),
            Err(CoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn wishlist_toggle_and_idempotent_add() {
        let mut wishlist = Wishlist::new();
        assert!(wishlist.add(ring()));
        assert!(!wishlist.add(ring()));
        assert_eq!(wishlist.len(), 1);

        assert!(!wishlist.toggle(ring()));
        assert!(!wishlist.contains(1));
        assert!(wishlist.toggle(ring()));
        assert!(wishlist.contains(1));
    }

    #[test]
    fn wishlist_is_independent_of_cart() {
        let mut cart = Cart::new();
        let mut wishlist = Wishlist::new();
        cart.add(ring());
        wishlist.add(earrings());
        cart.clear();
        assert!(wishlist.contains(2));

        let restored = Wishlist::restore(&wishlist.snapshot().expect("snapshot")).expect("restore");
        assert_eq!(restored.len(), 1);
    }
}
