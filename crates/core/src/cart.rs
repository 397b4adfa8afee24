//! Persisted shopping cart.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    models::EquipmentItem,
    storage::{LocalStore, CART_KEY},
};

/// One line of the cart: an item snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Item as it was when added.
    #[serde(flatten)]
    pub item: EquipmentItem,
    /// Units selected, at least 1.
    pub quantity: u32,
}

impl CartEntry {
    /// Price of the line.
    pub fn subtotal(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// Cart persisted under the `cart` storage key.
///
/// Every mutation reads the whole collection, changes it and writes it back.
#[derive(Debug, Clone)]
pub struct CartStore {
    store: LocalStore,
}

impl CartStore {
    /// Cart stored in `store`.
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Current entries in insertion order.
    pub fn entries(&self) -> Result<Vec<CartEntry>> {
        let entries: Vec<CartEntry> = self
            .store
            .get(CART_KEY)
            .context("failed to load cart")?
            .unwrap_or_default();
        Ok(normalize(entries))
    }

    /// Add one unit of `item` and return the resulting quantity.
    pub fn add_item(&self, item: &EquipmentItem) -> Result<u32> {
        let mut entries = self.entries()?;
        let quantity = match entries.iter_mut().find(|entry| entry.item.id == item.id) {
            Some(entry) => {
                entry.quantity = entry.quantity.saturating_add(1);
                entry.quantity
            }
            None => {
                entries.push(CartEntry {
                    item: item.clone(),
                    quantity: 1,
                });
                1
            }
        };
        self.store
            .set(CART_KEY, &entries)
            .context("failed to save cart")?;
        info!(item_id = %item.id, quantity, "added to cart");
        Ok(quantity)
    }

    /// Sum of quantities.
    pub fn len(&self) -> Result<u32> {
        Ok(self
            .entries()?
            .iter()
            .fold(0u32, |total, entry| total.saturating_add(entry.quantity)))
    }

    /// True when nothing is in the cart.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.entries()?.is_empty())
    }

    /// Total price of the cart.
    pub fn total(&self) -> Result<f64> {
        Ok(self.entries()?.iter().map(CartEntry::subtotal).sum())
    }

    /// Empty the cart.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(CART_KEY).context("failed to clear cart")
    }
}

/// Merge duplicate ids and lift zero quantities found in stored data.
fn normalize(entries: Vec<CartEntry>) -> Vec<CartEntry> {
    let mut merged: Vec<CartEntry> = Vec::with_capacity(entries.len());
    for mut entry in entries {
        entry.quantity = entry.quantity.max(1);
        match merged.iter_mut().find(|existing| existing.item.id == entry.item.id) {
            Some(existing) => {
                warn!(item_id = %entry.item.id, "merging duplicate cart entry");
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
            }
            None => merged.push(entry),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn item(id: &str, price: f64) -> EquipmentItem {
        EquipmentItem {
            id: id.to_string(),
            name: format!("Article {id}"),
            description: String::new(),
            category: "textile".to_string(),
            brand: Some("Kipsta".to_string()),
            price,
            stock: 4,
            is_available: true,
            images: vec!["https://img.example/1.jpg".to_string()],
            specifications: None,
            created_at: None,
        }
    }

    #[test]
    fn repeated_add_increments_quantity() -> Result<()> {
        let dir = tempdir()?;
        let cart = CartStore::new(LocalStore::new(dir.path()));

        assert_eq!(cart.add_item(&item("a", 10.0))?, 1);
        assert_eq!(cart.add_item(&item("a", 10.0))?, 2);
        assert_eq!(cart.add_item(&item("b", 5.5))?, 1);

        let entries = cart.entries()?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].item.id, "a");
        assert_eq!(entries[0].quantity, 2);
        assert_eq!(cart.len()?, 3);
        assert!((cart.total()? - 25.5).abs() < f64::EPSILON);

        cart.clear()?;
        assert!(cart.is_empty()?);
        Ok(())
    }

    #[test]
    fn persisted_layout_is_flat() -> Result<()> {
        let dir = tempdir()?;
        let cart = CartStore::new(LocalStore::new(dir.path()));
        cart.add_item(&item("a", 10.0))?;

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("cart.json"))?)?;
        assert_eq!(raw[0]["_id"], "a");
        assert_eq!(raw[0]["quantity"], 1);
        Ok(())
    }

    #[test]
    fn stored_duplicates_are_merged() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("cart.json"),
            r#"[
                {"_id":"a","name":"A","price":1.0,"quantity":0},
                {"_id":"a","name":"A","price":1.0,"quantity":2}
            ]"#,
        )?;
        let cart = CartStore::new(LocalStore::new(dir.path()));
        let entries = cart.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, 3);
        Ok(())
    }
}
