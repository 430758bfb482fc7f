//! # Inventory Rules
//!
//! Category and product forms, restocking, low-stock detection and the
//! numbers shown at the top of the inventory screen.
//!
//! ## Restock Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RestockRequest { qty: 20, cost: None }                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  plan_restock(product, request) ──► RestockRecord                       │
//! │        │                              previous  = 5                     │
//! │        │                              added     = 20                    │
//! │        │                              new       = 25                    │
//! │        │                              total     = cost × 20             │
//! │        ▼                                                                │
//! │  apply_restock(&mut product, &record) ──► quantity = 25, last_restocked │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Category, Product, RestockRecord};
use crate::validation::{
    validate_category_name, validate_price, validate_product_name, validate_quantity,
    validate_sku, validate_stock_level, validate_subcategories,
};

// =============================================================================
// Categories & Products
// =============================================================================

impl Category {
    /// Builds a validated category with a fresh id.
    pub fn new(name: &str, subcategories: Vec<String>, now: DateTime<Utc>) -> CoreResult<Self> {
        validate_category_name(name)?;
        let subcategories = clean_subcategories(subcategories)?;
        Ok(Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            subcategories,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn rename(&mut self, name: &str, now: DateTime<Utc>) -> CoreResult<()> {
        validate_category_name(name)?;
        self.name = name.trim().to_string();
        self.updated_at = now;
        Ok(())
    }

    pub fn set_subcategories(&mut self, names: Vec<String>, now: DateTime<Utc>) -> CoreResult<()> {
        self.subcategories = clean_subcategories(names)?;
        self.updated_at = now;
        Ok(())
    }

    /// Finds a subcategory by name, ignoring case.
    pub fn subcategory(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.subcategories
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }
}

fn clean_subcategories(names: Vec<String>) -> CoreResult<Vec<String>> {
    let names: Vec<String> = names.into_iter().map(|n| n.trim().to_string()).collect();
    validate_subcategories(&names)?;
    Ok(names)
}

/// The editable fields of a product, as entered on the inventory form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub subcategory: Option<String>,
    pub price: Money,
    pub cost_price: Money,
    pub quantity: i64,
    pub min_quantity: i64,
}

impl ProductDraft {
    pub fn validate(&self) -> CoreResult<()> {
        validate_product_name(&self.name)?;
        validate_sku(&self.sku)?;
        validate_price("price", self.price)?;
        validate_price("cost price", self.cost_price)?;
        validate_stock_level("quantity", self.quantity)?;
        validate_stock_level("min quantity", self.min_quantity)?;
        Ok(())
    }

    /// Creates a new product in `category`.
    pub fn into_product(self, category: &Category, now: DateTime<Utc>) -> CoreResult<Product> {
        let mut product = Product {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            category_id: String::new(),
            category_name: String::new(),
            subcategory: None,
            price: Money::zero(),
            cost_price: Money::zero(),
            quantity: 0,
            min_quantity: 0,
            sku: String::new(),
            created_at: now,
            updated_at: now,
            last_restocked: None,
        };
        self.apply_to(&mut product, category, now)?;
        Ok(product)
    }

    /// Overwrites the editable fields of an existing product.
    pub fn apply_to(
        self,
        product: &mut Product,
        category: &Category,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.validate()?;

        let subcategory = match self.subcategory.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(sub) => Some(
                category
                    .subcategory(sub)
                    .ok_or_else(|| ValidationError::InvalidFormat {
                        field: "subcategory".to_string(),
                        reason: format!("'{}' is not a subcategory of {}", sub, category.name),
                    })?
                    .to_string(),
            ),
        };

        product.name = self.name.trim().to_string();
        product.sku = self.sku.trim().to_string();
        product.category_id = category.id.clone();
        product.category_name = category.name.clone();
        product.subcategory = subcategory;
        product.price = self.price;
        product.cost_price = self.cost_price;
        product.quantity = self.quantity;
        product.min_quantity = self.min_quantity;
        product.updated_at = now;
        Ok(())
    }
}

impl From<&Product> for ProductDraft {
    fn from(p: &Product) -> Self {
        ProductDraft {
            name: p.name.clone(),
            sku: p.sku.clone(),
            subcategory: p.subcategory.clone(),
            price: p.price,
            cost_price: p.cost_price,
            quantity: p.quantity,
            min_quantity: p.min_quantity,
        }
    }
}

// =============================================================================
// Restock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockRequest {
    pub quantity: i64,
    /// New unit cost; keeps the product's current cost when absent.
    pub cost_price: Option<Money>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

/// Builds the history record for a restock. Does not modify the product.
pub fn plan_restock(
    product: &Product,
    request: RestockRequest,
    restocked_by: &str,
    now: DateTime<Utc>,
) -> CoreResult<RestockRecord> {
    validate_quantity(request.quantity)?;

    let cost_price = request.cost_price.unwrap_or(product.cost_price);
    validate_price("cost price", cost_price)?;

    let new_quantity = product
        .quantity
        .checked_add(request.quantity)
        .unwrap_or(i64::MAX);
    validate_stock_level("quantity", new_quantity)?;

    Ok(RestockRecord {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        previous_quantity: product.quantity,
        quantity_added: request.quantity,
        new_quantity,
        cost_price,
        total_cost: cost_price.times(request.quantity),
        restocked_by: restocked_by.to_string(),
        supplier: non_blank(request.supplier),
        notes: non_blank(request.notes),
        created_at: now,
    })
}

/// Applies a planned restock to the product it was planned for.
pub fn apply_restock(product: &mut Product, record: &RestockRecord) {
    product.quantity = record.new_quantity;
    product.cost_price = record.cost_price;
    product.last_restocked = Some(record.created_at);
    product.updated_at = record.created_at;
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Low Stock & Category Guard
// =============================================================================

/// Products at or below their threshold, lowest stock first.
pub fn low_stock<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
    let mut low: Vec<&Product> = products.into_iter().filter(|p| p.is_low_stock()).collect();
    low.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
    low
}

/// Fails with `CategoryInUse` if any product still points at the category.
pub fn ensure_category_unused<'a>(
    category_id: &str,
    category_name: &str,
    products: impl IntoIterator<Item = &'a Product>,
) -> CoreResult<()> {
    let product_count = products
        .into_iter()
        .filter(|p| p.category_id == category_id)
        .count();

    if product_count > 0 {
        return Err(CoreError::CategoryInUse {
            name: category_name.to_string(),
            product_count,
        });
    }
    Ok(())
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySummary {
    pub product_count: usize,
    pub total_units: i64,
    pub value_at_cost: Money,
    pub value_at_price: Money,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

impl InventorySummary {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        products
            .into_iter()
            .fold(InventorySummary::default(), |mut s, p| {
                s.product_count += 1;
                s.total_units += p.quantity;
                s.value_at_cost += p.stock_value_at_cost();
                s.value_at_price += p.stock_value_at_price();
                if p.is_low_stock() {
                    s.low_stock_count += 1;
                }
                if p.is_out_of_stock() {
                    s.out_of_stock_count += 1;
                }
                s
            })
    }
}

// =============================================================================
// Filtering
// =============================================================================

/// Inventory screen filters. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Case-insensitive substring of name or SKU.
    pub text: Option<String>,
    pub category_id: Option<String>,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            if !product.name.to_lowercase().contains(&needle)
                && !product.sku.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        if let Some(category_id) = &self.category_id {
            if &product.category_id != category_id {
                return false;
            }
        }

        if let Some(sub) = &self.subcategory {
            match &product.subcategory {
                Some(p) if p.eq_ignore_ascii_case(sub) => {}
                _ => return false,
            }
        }

        !self.low_stock_only || product.is_low_stock()
    }

    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::test_product;

    fn request(quantity: i64, cost: Option<i64>) -> RestockRequest {
        RestockRequest {
            quantity,
            cost_price: cost.map(Money::from_minor),
            supplier: Some("Kariakoo Motors".to_string()),
            notes: Some("   ".to_string()),
        }
    }

    fn draft(sku: &str, subcategory: Option<&str>) -> ProductDraft {
        ProductDraft {
            name: " Brake Pad Front ".to_string(),
            sku: sku.to_string(),
            subcategory: subcategory.map(str::to_string),
            price: Money::from_minor(15_000),
            cost_price: Money::from_minor(9_000),
            quantity: 4,
            min_quantity: 2,
        }
    }

    #[test]
    fn test_category_new_trims_and_validates() {
        let category = Category::new(
            "  Brakes ",
            vec![" Pads".to_string(), "Discs".to_string()],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(category.name, "Brakes");
        assert_eq!(category.subcategories, vec!["Pads", "Discs"]);
        assert_eq!(category.subcategory("pads"), Some("Pads"));

        assert!(Category::new("", vec![], Utc::now()).is_err());
        assert!(Category::new("Brakes", vec!["Pads".into(), "PADS".into()], Utc::now()).is_err());
    }

    #[test]
    fn test_draft_into_product() {
        let category =
            Category::new("Brakes", vec!["Pads".to_string()], Utc::now()).unwrap();
        let product = draft("BRK-PAD-F", Some("pads"))
            .into_product(&category, Utc::now())
            .unwrap();

        assert_eq!(product.name, "Brake Pad Front");
        assert_eq!(product.category_id, category.id);
        assert_eq!(product.category_name, "Brakes");
        assert_eq!(product.subcategory.as_deref(), Some("Pads"));
        assert_eq!(ProductDraft::from(&product).sku, "BRK-PAD-F");
    }

    #[test]
    fn test_draft_rejects_unknown_subcategory_and_bad_fields() {
        let category = Category::new("Brakes", vec![], Utc::now()).unwrap();
        assert!(draft("BRK-1", Some("Cables"))
            .into_product(&category, Utc::now())
            .is_err());
        assert!(draft("BAD SKU", None)
            .into_product(&category, Utc::now())
            .is_err());

        let mut negative = draft("BRK-2", None);
        negative.quantity = -1;
        assert!(negative.into_product(&category, Utc::now()).is_err());
    }

    #[test]
    fn test_restock_defaults_to_current_cost() {
        let product = test_product("1", 1000, 5);
        let record = plan_restock(&product, request(20, None), "Admin", Utc::now()).unwrap();

        assert_eq!(record.previous_quantity, 5);
        assert_eq!(record.new_quantity, 25);
        assert_eq!(record.cost_price, product.cost_price);
        assert_eq!(record.total_cost.minor(), 500 * 20);
        assert_eq!(record.supplier.as_deref(), Some("Kariakoo Motors"));
        assert!(record.notes.is_none());
    }

    #[test]
    fn test_restock_with_new_cost() {
        let mut product = test_product("1", 1000, 5);
        let record = plan_restock(&product, request(4, Some(700)), "Admin", Utc::now()).unwrap();
        assert_eq!(record.total_cost.minor(), 2800);

        apply_restock(&mut product, &record);
        assert_eq!(product.quantity, 9);
        assert_eq!(product.cost_price.minor(), 700);
        assert_eq!(product.last_restocked, Some(record.created_at));
    }

    #[test]
    fn test_restock_never_decreases() {
        let product = test_product("1", 1000, 5);
        assert!(plan_restock(&product, request(0, None), "Admin", Utc::now()).is_err());
        assert!(plan_restock(&product, request(-3, None), "Admin", Utc::now()).is_err());
        assert!(plan_restock(&product, request(1, Some(-1)), "Admin", Utc::now()).is_err());
    }

    #[test]
    fn test_restock_stays_within_limits() {
        let full = test_product("1", 1000, crate::MAX_STOCK_LEVEL);
        let err = plan_restock(&full, request(1, None), "Admin", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let corrupt = test_product("2", 1000, i64::MAX);
        assert!(plan_restock(&corrupt, request(1, None), "Admin", Utc::now()).is_err());

        let product = test_product("3", 1000, 5);
        assert!(plan_restock(&product, request(1, Some(i64::MAX)), "Admin", Utc::now()).is_err());
    }

    #[test]
    fn test_draft_rejects_amounts_over_ceiling() {
        let category = Category::new("Brakes", vec![], Utc::now()).unwrap();

        let mut pricey = draft("BRK-3", None);
        pricey.price = Money::from_minor(i64::MAX / 2 + 1);
        assert!(pricey.into_product(&category, Utc::now()).is_err());

        let mut stocked = draft("BRK-4", None);
        stocked.quantity = i64::MAX;
        assert!(stocked.into_product(&category, Utc::now()).is_err());
    }

    #[test]
    fn test_low_stock_sorted() {
        let products = vec![
            test_product("a", 100, 2),
            test_product("b", 100, 50),
            test_product("c", 100, 0),
        ];
        let low = low_stock(&products);
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].id, "c");
        assert_eq!(low[1].id, "a");
    }

    #[test]
    fn test_category_in_use() {
        let products = vec![test_product("a", 100, 2), test_product("b", 100, 2)];
        let err = ensure_category_unused("cat-1", "Engine", &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CategoryInUse {
                product_count: 2,
                ..
            }
        ));
        assert!(ensure_category_unused("cat-2", "Brakes", &products).is_ok());
    }

    #[test]
    fn test_summary() {
        let products = vec![test_product("a", 1000, 3), test_product("b", 200, 0)];
        let summary = InventorySummary::from_products(&products);

        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.total_units, 3);
        assert_eq!(summary.value_at_price.minor(), 3000);
        assert_eq!(summary.value_at_cost.minor(), 1500);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.out_of_stock_count, 1);
    }

    #[test]
    fn test_filter() {
        let mut chain = test_product("chain", 100, 10);
        chain.name = "Drive Chain 428H".to_string();
        chain.subcategory = Some("Chains".to_string());
        let mut pad = test_product("pad", 100, 1);
        pad.category_id = "cat-2".to_string();

        let products = vec![chain, pad];

        let by_text = ProductFilter {
            text: Some("428h".to_string()),
            ..Default::default()
        };
        assert_eq!(by_text.apply(&products).len(), 1);

        let by_sku = ProductFilter {
            text: Some("sku-pad".to_string()),
            ..Default::default()
        };
        assert_eq!(by_sku.apply(&products)[0].id, "pad");

        let by_sub = ProductFilter {
            subcategory: Some("chains".to_string()),
            ..Default::default()
        };
        assert_eq!(by_sub.apply(&products)[0].id, "chain");

        let low = ProductFilter {
            category_id: Some("cat-2".to_string()),
            low_stock_only: true,
            ..Default::default()
        };
        assert_eq!(low.apply(&products).len(), 1);
        assert_eq!(ProductFilter::default().apply(&products).len(), 2);
    }
}
