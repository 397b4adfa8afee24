//! Client-side filtering and sorting of equipment listings.

use std::{cmp::Ordering, fmt, str::FromStr};

use crate::models::EquipmentItem;

/// Ordering applied to the displayed equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Name, lexicographic ascending.
    #[default]
    Name,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Most recently created first.
    Newest,
}

impl SortKey {
    /// All keys in menu order.
    pub const ALL: [SortKey; 4] = [
        SortKey::Name,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::Newest,
    ];

    /// Query-parameter spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Newest => "newest",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Nom (A-Z)",
            Self::PriceAsc => "Prix croissant",
            Self::PriceDesc => "Prix décroissant",
            Self::Newest => "Plus récent",
        }
    }

    /// The key following this one in menu order, wrapping around.
    pub fn next(&self) -> Self {
        let index = Self::ALL.iter().position(|key| key == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown sort key '{value}'"))
    }
}

/// Predicates and ordering selected by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentFilters {
    /// Display order.
    pub sort_by: SortKey,
    /// Inclusive lower price bound.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound.
    pub max_price: Option<f64>,
    /// Case-insensitive brand substring; empty means no filter.
    pub brand: String,
}

impl EquipmentFilters {
    /// Build filters from raw text inputs; non-numeric bounds are ignored.
    pub fn from_inputs(sort_by: SortKey, min_price: &str, max_price: &str, brand: &str) -> Self {
        Self {
            sort_by,
            min_price: parse_price(min_price),
            max_price: parse_price(max_price),
            brand: brand.trim().to_string(),
        }
    }

    fn accepts(&self, item: &EquipmentItem, needle: &str) -> bool {
        if self.min_price.is_some_and(|min| item.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price > max) {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        item.brand
            .as_deref()
            .map(|brand| brand.to_lowercase().contains(needle))
            .unwrap_or(false)
    }
}

/// Parse a user-typed price bound. Blank, non-numeric and non-finite input
/// yields `None`; a comma decimal separator is accepted.
pub fn parse_price(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Derive the display list from fetched items.
///
/// Returns a subset of `items`; equal elements keep their original order.
pub fn derive(items: &[EquipmentItem], filters: &EquipmentFilters) -> Vec<EquipmentItem> {
    let needle = filters.brand.to_lowercase();
    let mut selected: Vec<(usize, &EquipmentItem)> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| filters.accepts(item, &needle))
        .collect();

    match filters.sort_by {
        SortKey::Name => selected.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name)),
        SortKey::PriceAsc => selected.sort_by(|(_, a), (_, b)| compare_price(a, b)),
        SortKey::PriceDesc => selected.sort_by(|(_, a), (_, b)| compare_price(b, a)),
        // Dated items first, newest date first; undated or equal dates fall
        // back to reverse insert order.
        SortKey::Newest => selected.sort_by(|(ia, a), (ib, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| ib.cmp(ia))
        }),
    }

    selected.into_iter().map(|(_, item)| item.clone()).collect()
}

fn compare_price(a: &EquipmentItem, b: &EquipmentItem) -> Ordering {
    a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, name: &str, price: f64, brand: Option<&str>) -> EquipmentItem {
        EquipmentItem {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category: "ballons".to_string(),
            brand: brand.map(str::to_string),
            price,
            stock: 5,
            is_available: true,
            images: Vec::new(),
            specifications: None,
            created_at: None,
        }
    }

    fn prices(items: &[EquipmentItem]) -> Vec<f64> {
        items.iter().map(|item| item.price).collect()
    }

    #[test]
    fn min_price_then_descending() {
        let items = vec![
            item("a", "A", 10.0, None),
            item("b", "B", 20.0, None),
            item("c", "C", 30.0, None),
        ];
        let mut filters = EquipmentFilters::from_inputs(SortKey::Name, "15", "", "");
        assert_eq!(prices(&derive(&items, &filters)), vec![20.0, 30.0]);

        filters.sort_by = SortKey::PriceDesc;
        assert_eq!(prices(&derive(&items, &filters)), vec![30.0, 20.0]);
    }

    #[test]
    fn bounds_are_inclusive_and_garbage_is_ignored() {
        let items = vec![item("a", "A", 10.0, None), item("b", "B", 20.0, None)];
        let filters = EquipmentFilters::from_inputs(SortKey::Name, "10", "20", "");
        assert_eq!(derive(&items, &filters).len(), 2);

        let filters = EquipmentFilters::from_inputs(SortKey::Name, "abc", "NaN", "");
        assert_eq!(filters.min_price, None);
        assert_eq!(filters.max_price, None);
        assert_eq!(derive(&items, &filters).len(), 2);
        assert_eq!(parse_price("12,5"), Some(12.5));
    }

    #[test]
    fn narrower_band_never_grows_result() {
        let items: Vec<_> = (0..20)
            .map(|i| item(&i.to_string(), &format!("Item {i:02}"), f64::from(i * 5), None))
            .collect();
        let mut previous = usize::MAX;
        for (min, max) in [(0, 100), (10, 90), (20, 80), (40, 60), (50, 50), (51, 50)] {
            let filters = EquipmentFilters {
                min_price: Some(f64::from(min)),
                max_price: Some(f64::from(max)),
                ..EquipmentFilters::default()
            };
            let result = derive(&items, &filters);
            assert!(result.len() <= previous);
            assert!(result.iter().all(|entry| items.contains(entry)));
            previous = result.len();
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn brand_is_case_insensitive_substring() {
        let items = vec![
            item("a", "Ballon", 20.0, Some("Adidas")),
            item("b", "Raquette", 80.0, Some("Babolat")),
            item("c", "Gourde", 5.0, None),
        ];
        let filters = EquipmentFilters::from_inputs(SortKey::Name, "", "", " DID ");
        let result = derive(&items, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "a");
    }

    #[test]
    fn ties_keep_original_order() {
        let items = vec![
            item("first", "Same", 10.0, None),
            item("second", "Same", 10.0, None),
            item("third", "Other", 10.0, None),
        ];
        let ids = |sort_by| {
            let filters = EquipmentFilters {
                sort_by,
                ..EquipmentFilters::default()
            };
            derive(&items, &filters)
                .into_iter()
                .map(|entry| entry.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(SortKey::Name), vec!["third", "first", "second"]);
        assert_eq!(ids(SortKey::PriceAsc), vec!["first", "second", "third"]);
        assert_eq!(ids(SortKey::PriceDesc), vec!["first", "second", "third"]);
    }

    #[test]
    fn newest_uses_creation_date_then_insert_order() {
        let mut old = item("old", "Old", 1.0, None);
        old.created_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let mut new = item("new", "New", 1.0, None);
        new.created_at = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let filters = EquipmentFilters {
            sort_by: SortKey::Newest,
            ..EquipmentFilters::default()
        };
        let dated = derive(&[old.clone(), new.clone()], &filters);
        assert_eq!(dated[0].id, "new");

        let undated = derive(&[item("x", "X", 1.0, None), item("y", "Y", 1.0, None)], &filters);
        assert_eq!(undated[0].id, "y");
    }

    #[test]
    fn sort_keys_round_trip_through_text() {
        assert_eq!("price-desc".parse::<SortKey>(), Ok(SortKey::PriceDesc));
        assert!("cheapest".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Newest.next(), SortKey::Name);
    }
}
