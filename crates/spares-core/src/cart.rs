//! # Cart
//!
//! The sales-screen basket: line items, per-unit discounts and totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator Action          Cart Method             Cart State Change     │
//! │  ───────────────          ───────────             ─────────────────     │
//! │                                                                         │
//! │  Pick Product ───────────► add_item() ──────────► push or qty += n     │
//! │                                                                         │
//! │  Change Quantity ────────► update_quantity() ───► items[i].qty = n     │
//! │                                                                         │
//! │  Give Discount ──────────► set_discount() ──────► items[i].discount    │
//! │                                                                         │
//! │  Click Remove ───────────► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  Checkout ───────────────► checkout::plan_checkout(&cart, ...)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! # use chrono::Utc;
//! # use spares_core::{Money, Product};
//! use spares_core::cart::Cart;
//!
//! # let product = Product {
//! #     id: "p1".into(), name: "Clutch Cable".into(), category_id: "c1".into(),
//! #     category_name: "Cables".into(), subcategory: None,
//! #     price: Money::from_minor(1_000), cost_price: Money::from_minor(600),
//! #     quantity: 10, min_quantity: 2, sku: "CBL-CL".into(),
//! #     created_at: Utc::now(), updated_at: Utc::now(), last_restocked: None,
//! # };
//! let mut cart = Cart::new();
//! cart.add_item(&product, 2).unwrap();
//! cart.set_discount(&product.id, Money::from_minor(100)).unwrap();
//!
//! let totals = cart.totals();
//! assert_eq!(totals.total_amount.minor(), 2_000);
//! assert_eq!(totals.total_discount.minor(), 200);
//! assert_eq!(totals.final_amount.minor(), 1_800);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleItem};
use crate::validation::{validate_price, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the cart.
///
/// Name, SKU, price and the stock ceiling are frozen when the product is
/// added, so later edits to the product don't change an open cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    /// Discount per unit.
    pub discount: Money,
    pub quantity: i64,
    /// On-hand quantity when the item was added; the line can't exceed it.
    pub available: i64,
}

impl CartItem {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            discount: Money::zero(),
            quantity,
            available: product.quantity,
        }
    }

    /// `unit_price × quantity`
    pub fn gross(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// `discount × quantity`
    pub fn line_discount(&self) -> Money {
        self.discount.times(self.quantity)
    }

    /// `(unit_price − discount) × quantity`
    pub fn subtotal(&self) -> Money {
        (self.unit_price - self.discount).times(self.quantity)
    }

    /// Freezes the line into a sale item.
    pub fn to_sale_item(&self) -> SaleItem {
        SaleItem {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            sku: self.sku.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            discount: self.discount,
            subtotal: self.subtotal(),
        }
    }

    fn check_stock(&self, requested: i64) -> CoreResult<()> {
        if requested > self.available {
            return Err(CoreError::InsufficientStock {
                sku: self.sku.clone(),
                available: self.available,
                requested,
            });
        }
        Ok(())
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding again increases quantity)
/// - `0 < quantity <= available` for every line
/// - `0 <= discount <= unit_price` for every line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a product or increases its quantity if already present.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        // Imported records skip the inventory form
        validate_price("price", product.price)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.check_stock(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let item = CartItem::from_product(product, quantity);
        item.check_stock(quantity)?;
        self.items.push(item);
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        let item = self.find_mut(product_id)?;
        item.check_stock(quantity)?;
        item.quantity = quantity;
        Ok(())
    }

    /// Sets the per-unit discount for a line.
    pub fn set_discount(&mut self, product_id: &str, discount: Money) -> CoreResult<()> {
        validate_price("discount", discount)?;

        let item = self.find_mut(product_id)?;
        if discount > item.unit_price {
            return Err(CoreError::DiscountExceedsPrice {
                sku: item.sku.clone(),
                discount,
                unit_price: item.unit_price,
            });
        }
        item.discount = discount;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    fn find_mut(&mut self, product_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }
}

/// Cart totals summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    /// Gross, before discounts.
    pub total_amount: Money,
    pub total_discount: Money,
    pub final_amount: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let total_amount: Money = cart.items.iter().map(CartItem::gross).sum();
        let total_discount: Money = cart.items.iter().map(CartItem::line_discount).sum();
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_amount,
            total_discount,
            final_amount: total_amount - total_discount,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn test_product(id: &str, price: i64, quantity: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Part {}", id),
            category_id: "cat-1".to_string(),
            category_name: "Engine".to_string(),
            subcategory: None,
            price: Money::from_minor(price),
            cost_price: Money::from_minor(price / 2),
            quantity,
            min_quantity: 2,
            sku: format!("SKU-{}", id),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_restocked: None,
        }
    }

    #[test]
    fn test_discounted_line_example() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 10);

        cart.add_item(&product, 2).unwrap();
        cart.set_discount("1", Money::from_minor(100)).unwrap();

        assert_eq!(cart.items[0].subtotal().minor(), 1800);
        let totals = cart.totals();
        assert_eq!(totals.total_amount.minor(), 2000);
        assert_eq!(totals.total_discount.minor(), 200);
        assert_eq!(totals.final_amount.minor(), 1800);
    }

    #[test]
    fn test_price_over_ceiling_rejected() {
        let mut cart = Cart::new();
        let product = test_product("1", i64::MAX / 2 + 1, 10);

        let err = cart.add_item(&product, 2).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.is_empty());

        let priciest = test_product("2", crate::MAX_AMOUNT.minor(), MAX_ITEM_QUANTITY);
        cart.add_item(&priciest, MAX_ITEM_QUANTITY).unwrap();
        assert_eq!(
            cart.totals().final_amount,
            crate::MAX_AMOUNT.times(MAX_ITEM_QUANTITY)
        );
    }

    #[test]
    fn test_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 10);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_stock_ceiling() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 3);

        cart.add_item(&product, 2).unwrap();
        let err = cart.add_item(&product, 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert!(cart.update_quantity("1", 4).is_err());
        cart.update_quantity("1", 3).unwrap();
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_out_of_stock_product_cannot_be_added() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 0);
        assert!(cart.add_item(&product, 1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_discount_cannot_exceed_price() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 500, 5), 1).unwrap();

        assert!(matches!(
            cart.set_discount("1", Money::from_minor(501)),
            Err(CoreError::DiscountExceedsPrice { .. })
        ));
        assert!(cart.set_discount("1", Money::from_minor(-1)).is_err());
        cart.set_discount("1", Money::from_minor(500)).unwrap();
        assert!(cart.totals().final_amount.is_zero());
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 500, 5), 1).unwrap();
        cart.update_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            cart.remove_item("1"),
            Err(CoreError::NotInCart(_))
        ));
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), 100, 5), 1)
                .unwrap();
        }
        let err = cart
            .add_item(&test_product("overflow", 100, 5), 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_sale_item_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("7", 2500, 5), 3).unwrap();
        cart.set_discount("7", Money::from_minor(500)).unwrap();

        let item = cart.items[0].to_sale_item();
        assert_eq!(item.sku, "SKU-7");
        assert_eq!(item.gross().minor(), 7500);
        assert_eq!(item.line_discount().minor(), 1500);
        assert_eq!(item.subtotal.minor(), 6000);
    }
}
