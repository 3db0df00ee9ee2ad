//! Store directory helpers: search, per-store order lists, new-store
//! defaults.

use crate::types::{Order, Store};

/// City recorded for a new store created without one.
pub const UNKNOWN_CITY: &str = "Desconocida";

/// Stores whose name or city contains `term` (case-insensitive), sorted
/// by name.
pub fn search_stores<'a>(stores: &'a [Store], term: &str) -> Vec<&'a Store> {
    let needle = term.trim().to_lowercase();
    let mut found: Vec<&Store> = stores
        .iter()
        .filter(|s| {
            needle.is_empty()
                || s.name.to_lowercase().contains(&needle)
                || s.city.to_lowercase().contains(&needle)
        })
        .collect();
    found.sort_by_key(|s| s.name.to_lowercase());
    found
}

/// Orders of `store_id`, newest number first.
pub fn orders_for_store<'a>(orders: &'a [Order], store_id: &str) -> Vec<&'a Order> {
    let mut found: Vec<&Order> = orders.iter().filter(|o| o.store_id == store_id).collect();
    found.sort_by(|a, b| b.number.cmp(&a.number));
    found
}

/// Normalises a store about to be created: trims the name and fills the
/// city when left blank.
pub fn prepare_new_store(mut store: Store) -> Store {
    store.name = store.name.trim().to_string();
    if store.city.trim().is_empty() {
        store.city = UNKNOWN_CITY.to_string();
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AppSettings;
    use crate::order::new_order;
    use chrono::NaiveDate;

    #[test]
    fn test_search_matches_name_or_city() {
        let stores = vec![
            Store::new("Zapatitos", "Bilbao"),
            Store::new("alegría", "Madrid"),
            Store::new("Bambú", "Mataró"),
        ];

        let names: Vec<&str> = search_stores(&stores, "MA").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alegría", "Bambú"]);

        let all = search_stores(&stores, "");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "alegría");
    }

    #[test]
    fn test_orders_sorted_by_number_desc() {
        let settings = AppSettings::default();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let orders = vec![
            new_order("a", &settings, 0, date),
            new_order("b", &settings, 1, date),
            new_order("a", &settings, 2, date),
        ];

        let numbers: Vec<&str> = orders_for_store(&orders, "a")
            .iter()
            .map(|o| o.number.as_str())
            .collect();
        assert_eq!(numbers, vec!["PED-0003", "PED-0001"]);
    }

    #[test]
    fn test_prepare_new_store() {
        let store = prepare_new_store(Store::new("  Luna ", " "));
        assert_eq!(store.name, "Luna");
        assert_eq!(store.city, UNKNOWN_CITY);
    }
}
