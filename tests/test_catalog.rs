//! Catalog client behavior that needs no network.

mod common;

use std::time::Duration;

use cocktail_party::CatalogClient;
use common::*;

// Nothing listens here; any request that slips through fails fast.
const UNREACHABLE: &str = "http://127.0.0.1:9";

fn offline_client() -> CatalogClient {
    CatalogClient::new(Duration::from_millis(200)).with_base_url(UNREACHABLE)
}

#[test]
fn cached_lookups_skip_the_network() {
    let mut catalog = offline_client();
    catalog.insert(margarita());
    catalog.insert(mojito());
    assert_eq!(catalog.cache_len(), 2);

    let found = catalog.lookup_by_id("11007").unwrap().unwrap();
    assert_eq!(found.name, "Margarita");

    let ids = vec!["11000".to_string(), "11007".to_string()];
    let many = catalog.lookup_many(&ids);
    let names: Vec<&str> = many.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Mojito", "Margarita"]);
}

#[test]
fn lookup_many_skips_failures() {
    let mut catalog = offline_client();
    catalog.insert(daiquiri());

    let ids = vec!["404".to_string(), "11006".to_string()];
    let found = catalog.lookup_many(&ids);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "11006");
}

#[test]
fn unreachable_catalog_is_an_error() {
    let mut catalog = offline_client();
    assert!(catalog.lookup_by_id("11007").is_err());
    assert!(catalog.search_by_name("margarita").is_err());
}

#[test]
fn blank_queries_return_nothing() {
    let mut catalog = offline_client();
    assert!(catalog.search_by_name("   ").unwrap().is_empty());
    assert!(catalog.browse_by_first_letter('#').unwrap().is_empty());
    assert!(catalog.filter_ids_by_ingredient("").unwrap().is_empty());
    assert!(catalog.filter_ids_by_ingredients(&[]).unwrap().is_empty());
}

#[test]
fn clear_cache_and_close() {
    let mut catalog = offline_client();
    catalog.insert(screwdriver());
    assert!(catalog.cached("11963").is_some());

    catalog.clear_cache();
    assert_eq!(catalog.cache_len(), 0);
    catalog.close();
    assert!(catalog.cached("11963").is_none());
}

#[test]
fn popular_cocktails_tolerates_failed_searches() {
    let mut catalog = offline_client();
    assert!(catalog.popular_cocktails().is_empty());
}
