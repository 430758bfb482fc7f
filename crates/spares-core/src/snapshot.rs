//! # Store Snapshot
//!
//! The whole store as one JSON object, keyed the way the browser UI keys its
//! storage:
//!
//! ```text
//! {
//!   "categories":      [Category, ...],
//!   "inventory":       [Product, ...],
//!   "sales":           [Sale, ...],
//!   "credits":         [Credit, ...],
//!   "restock_history": [RestockRecord, ...],
//!   "current_user":    Operator | null
//! }
//! ```
//!
//! A key that is missing or can't be read comes back empty and is reported
//! in [`LoadedSnapshot::skipped`], so one bad array doesn't lose the rest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::types::{Category, Credit, Operator, Product, RestockRecord, Sale};

pub const KEY_CATEGORIES: &str = "categories";
pub const KEY_INVENTORY: &str = "inventory";
pub const KEY_SALES: &str = "sales";
pub const KEY_CREDITS: &str = "credits";
pub const KEY_RESTOCK_HISTORY: &str = "restock_history";
pub const KEY_CURRENT_USER: &str = "current_user";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub inventory: Vec<Product>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub credits: Vec<Credit>,
    #[serde(default)]
    pub restock_history: Vec<RestockRecord>,
    #[serde(default)]
    pub current_user: Option<Operator>,
}

/// A parsed snapshot plus the keys that had to be dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSnapshot {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKey {
    pub key: &'static str,
    pub reason: String,
}

/// Record counts, used to report what an export or import touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SnapshotCounts {
    pub categories: usize,
    pub products: usize,
    pub sales: usize,
    pub credits: usize,
    pub restocks: usize,
}

impl Snapshot {
    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            categories: self.categories.len(),
            products: self.inventory.len(),
            sales: self.sales.len(),
            credits: self.credits.len(),
            restocks: self.restock_history.len(),
        }
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| invalid(e.to_string()).into())
    }

    /// Parses a snapshot, keeping every key that reads cleanly.
    ///
    /// Only a document that isn't a JSON object at all is an error.
    pub fn from_json_lenient(json: &str) -> CoreResult<LoadedSnapshot> {
        let value: Value = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        let Value::Object(mut map) = value else {
            return Err(invalid("top level must be a JSON object".to_string()).into());
        };

        let mut skipped = Vec::new();
        let mut take = |key: &'static str| map.remove(key);

        let categories = read_key(KEY_CATEGORIES, take(KEY_CATEGORIES), &mut skipped);
        let inventory = read_key(KEY_INVENTORY, take(KEY_INVENTORY), &mut skipped);
        let sales = read_key(KEY_SALES, take(KEY_SALES), &mut skipped);
        let credits = read_key(KEY_CREDITS, take(KEY_CREDITS), &mut skipped);
        let restock_history =
            read_key(KEY_RESTOCK_HISTORY, take(KEY_RESTOCK_HISTORY), &mut skipped);
        let current_user = read_key(KEY_CURRENT_USER, take(KEY_CURRENT_USER), &mut skipped);

        Ok(LoadedSnapshot {
            snapshot: Snapshot {
                categories,
                inventory,
                sales,
                credits,
                restock_history,
                current_user,
            },
            skipped,
        })
    }
}

fn read_key<T: DeserializeOwned + Default>(
    key: &'static str,
    value: Option<Value>,
    skipped: &mut Vec<SkippedKey>,
) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(v) => serde_json::from_value(v).unwrap_or_else(|e| {
            skipped.push(SkippedKey {
                key,
                reason: e.to_string(),
            });
            T::default()
        }),
    }
}

fn invalid(reason: String) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "snapshot".to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::test_product;
    use crate::credit::tests::test_credit;

    #[test]
    fn test_storage_keys() {
        let snapshot = Snapshot {
            inventory: vec![test_product("1", 100, 1)],
            current_user: Some(Operator::default()),
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            KEY_CATEGORIES,
            KEY_INVENTORY,
            KEY_SALES,
            KEY_CREDITS,
            KEY_RESTOCK_HISTORY,
            KEY_CURRENT_USER,
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert!(value["inventory"][0].get("minQuantity").is_some());
    }

    #[test]
    fn test_round_trip_keeps_records() {
        let snapshot = Snapshot {
            inventory: vec![test_product("1", 100, 1)],
            credits: vec![test_credit("Juma", 2000)],
            ..Default::default()
        };
        let json = snapshot.to_json_pretty().unwrap();
        let loaded = Snapshot::from_json_lenient(&json).unwrap();
        assert!(loaded.skipped.is_empty());
        assert_eq!(loaded.snapshot, snapshot);
        assert_eq!(loaded.snapshot.counts().credits, 1);
    }

    #[test]
    fn test_bad_key_falls_back_to_empty() {
        let json = r#"{
            "categories": "not an array",
            "sales": [],
            "current_user": {"name": "Neema", "role": "cashier"}
        }"#;
        let loaded = Snapshot::from_json_lenient(json).unwrap();

        assert!(loaded.snapshot.categories.is_empty());
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].key, KEY_CATEGORIES);
        assert_eq!(loaded.snapshot.current_user.unwrap().name, "Neema");
    }

    #[test]
    fn test_not_an_object() {
        assert!(Snapshot::from_json_lenient("[1,2,3]").is_err());
        assert!(Snapshot::from_json_lenient("{").is_err());
    }
}
