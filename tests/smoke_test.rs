//! Live smoke test against TheCocktailDB.
//!
//! The party document lives in memory, so no JSONBin credentials are needed.
//!
//! Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use std::time::Duration;

use cocktail_party::stats::{ingredient_stats, BudgetReport};
use cocktail_party::{
    find_similar, AppStateController, CatalogClient, MemoryBackend, RemoteStateStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn section(name: &str) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("  {}", name);
    eprintln!("{}", "=".repeat(60));
}

// ---------------------------------------------------------------------------
// Smoke test
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn smoke_test_live_catalog() {
    let mut catalog = CatalogClient::new(Duration::from_secs(30));

    section("Search");
    let margaritas = catalog.search_by_name("margarita").unwrap();
    eprintln!("  search 'margarita': {} results", margaritas.len());
    assert!(!margaritas.is_empty());
    assert!(margaritas.iter().all(|c| !c.id.is_empty()));

    let letter_b = catalog.browse_by_first_letter('b').unwrap();
    eprintln!("  browse 'b': {} results", letter_b.len());

    let missing = catalog.search_by_name("zzzz-no-such-cocktail").unwrap();
    assert!(missing.is_empty());

    section("Lookup");
    let margarita = catalog.lookup_by_id("11007").unwrap().unwrap();
    eprintln!("  11007 = {} ({} ingredients)", margarita.name, margarita.ingredients.len());
    assert_eq!(margarita.name, "Margarita");
    assert!(catalog.lookup_by_id("0").unwrap().is_none());

    section("Filters");
    let gin = catalog.filter_ids_by_ingredient("Gin").unwrap();
    let gin_and_lemon = catalog.filter_ids_by_ingredients(&["Gin", "Lemon"]).unwrap();
    eprintln!("  gin: {}, gin + lemon: {}", gin.len(), gin_and_lemon.len());
    assert!(gin_and_lemon.len() <= gin.len());

    let mocktails = catalog.search_with_filter("punch", Some(false)).unwrap();
    eprintln!("  non-alcoholic punches: {}", mocktails.len());

    section("Party");
    let popular = catalog.popular_cocktails();
    eprintln!("  popular: {}", popular.len());
    assert!(!popular.is_empty());

    let mut party = AppStateController::new(RemoteStateStore::new(MemoryBackend::new()));
    party
        .set_shortlist(popular.iter().map(|c| c.id.clone()).collect())
        .unwrap();
    party.set_user_name("u_smoke", "Smoke").unwrap();
    for cocktail in popular.iter().take(3) {
        party.toggle_vote("u_smoke", &cocktail.id).unwrap();
    }

    let voted: Vec<_> = popular.iter().take(3).cloned().collect();
    let summary = ingredient_stats(&voted);
    let report = BudgetReport::check(&summary, &party.state().config);
    eprintln!(
        "  shopping list: {} ingredients, {} spirits, over budget: {}",
        summary.total_ingredients,
        summary.total_spirits,
        report.is_over_budget()
    );
    for line in summary.spirits.iter().chain(&summary.ingredients) {
        eprintln!(
            "    {:<24} x{} {}",
            line.name,
            line.count,
            line.measure.as_ref().map(|m| m.display.as_str()).unwrap_or("-")
        );
    }

    let similar = find_similar(&margarita, &popular, 3);
    eprintln!(
        "  similar to Margarita: {:?}",
        similar.iter().map(|c| &c.name).collect::<Vec<_>>()
    );
}
