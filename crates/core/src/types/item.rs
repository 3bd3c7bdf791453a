//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// One product line in the cart.
///
/// The serialized field names (`id`, `title`, `image_url`, `price`,
/// `quantity`) are the persisted cart format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog product ID; unique within a cart unless duplicates are appended.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Product image URL.
    pub image_url: String,
    /// Unit price.
    pub price: Price,
    /// Number of units. Not validated; may go negative.
    pub quantity: i64,
}

impl CartItem {
    /// Total price of this line (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> rust_decimal::Decimal {
        self.price.line_total(self.quantity)
    }
}

/// A product as offered to the cart, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl NewCartItem {
    /// Create a new product descriptor.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: impl Into<Price>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price: price.into(),
        }
    }

    /// Turn the descriptor into a cart line with the given quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: i64) -> CartItem {
        CartItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_quantity() {
        let item = NewCartItem::new("p1", "Shirt", "u", 10).with_quantity(1);
        assert_eq!(item.id, "p1");
        assert_eq!(item.title, "Shirt");
        assert_eq!(item.image_url, "u");
        assert_eq!(item.price, Price::from(10));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn test_line_total() {
        let item = NewCartItem::new("p1", "Shirt", "u", 10).with_quantity(3);
        assert_eq!(item.line_total(), rust_decimal::Decimal::from(30));
    }

    #[test]
    fn test_wire_field_names() {
        let item = NewCartItem::new("p1", "Shirt", "u", 10).with_quantity(2);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], "p1");
        assert_eq!(value["title"], "Shirt");
        assert_eq!(value["image_url"], "u");
        assert_eq!(value["price"], 10.0);
        assert_eq!(value["quantity"], 2);
    }

    #[test]
    fn test_new_item_has_no_quantity_field() {
        let json = r#"{"id":"p1","title":"Shirt","image_url":"u","price":10}"#;
        let parsed: NewCartItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, NewCartItem::new("p1", "Shirt", "u", 10));
    }
}
