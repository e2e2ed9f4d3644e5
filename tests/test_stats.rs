//! Shopping list, budget and vote summaries.

mod common;

use cocktail_party::stats::{
    ingredient_stats, is_base_spirit, member_count, vote_tally, BudgetReport, IngredientSummary,
};
use cocktail_party::{AppConfig, AppState};
use common::*;

fn names(lines: &[cocktail_party::stats::IngredientStats]) -> Vec<&str> {
    lines.iter().map(|l| l.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// is_base_spirit
// ---------------------------------------------------------------------------

#[test]
fn recognizes_spirits() {
    assert!(is_base_spirit("Tequila"));
    assert!(is_base_spirit("Light rum"));
    assert!(is_base_spirit("  BOURBON "));
    assert!(is_base_spirit("Whisk"));
    assert!(!is_base_spirit("Lime juice"));
    assert!(!is_base_spirit("Triple sec"));
    assert!(!is_base_spirit(""));
}

// ---------------------------------------------------------------------------
// ingredient_stats
// ---------------------------------------------------------------------------

#[test]
fn no_cocktails_no_ingredients() {
    assert_eq!(ingredient_stats(&[]), IngredientSummary::default());
}

#[test]
fn merges_ingredients_across_cocktails() {
    let summary = ingredient_stats(&[margarita(), tommys_margarita(), daiquiri()]);

    assert_eq!(summary.total_ingredients, 8);
    assert_eq!(summary.total_spirits, 2);
    assert_eq!(names(&summary.spirits), vec!["Tequila", "Light rum"]);
    assert_eq!(
        names(&summary.ingredients),
        vec![
            "Lime juice",
            "Triple sec",
            "Salt",
            "Agave syrup",
            "Lime",
            "Powdered sugar"
        ]
    );

    let tequila = &summary.spirits[0];
    assert_eq!(tequila.count, 2);
    assert!(tequila.is_spirit);
    assert_eq!(tequila.measure.as_ref().unwrap().display, "3 oz");

    let lime_juice = &summary.ingredients[0];
    assert_eq!(lime_juice.count, 2);
    assert_eq!(lime_juice.measure.as_ref().unwrap().display, "2 oz");

    let salt = &summary.ingredients[2];
    assert!(salt.measure.is_none());
}

#[test]
fn ingredient_names_match_case_insensitively() {
    let a = cocktail("1", "A", &[("Vodka", Some("1 oz"))]);
    let b = cocktail("2", "B", &[("VODKA ", Some("1/2 oz"))]);
    let summary = ingredient_stats(&[a, b]);

    assert_eq!(summary.total_ingredients, 1);
    let vodka = &summary.spirits[0];
    assert_eq!(vodka.name, "Vodka");
    assert_eq!(vodka.count, 2);
    assert_eq!(vodka.measure.as_ref().unwrap().display, "1 1/2 oz");
}

#[test]
fn cocktails_without_ingredients_add_nothing() {
    let summary = ingredient_stats(&[empty_glass(), screwdriver()]);
    assert_eq!(summary.total_ingredients, 2);
    assert_eq!(names(&summary.spirits), vec!["Vodka"]);
}

// ---------------------------------------------------------------------------
// BudgetReport
// ---------------------------------------------------------------------------

#[test]
fn budget_within_default_limits() {
    let summary = ingredient_stats(&[margarita(), tommys_margarita(), daiquiri()]);
    let report = BudgetReport::check(&summary, &AppConfig::default());

    assert!(!report.is_over_budget());
    assert_eq!(report.ingredient_excess(), 0);
    assert!((report.ingredient_percent() - 8.0 / 30.0 * 100.0).abs() < 1e-9);
    assert!((report.spirit_percent() - 2.0 / 3.0 * 100.0).abs() < 1e-9);
}

#[test]
fn budget_over_tight_limits() {
    let summary = ingredient_stats(&[margarita(), tommys_margarita(), daiquiri()]);
    let config = AppConfig {
        max_ingredients: 5,
        max_liquors: 1,
    };
    let report = BudgetReport::check(&summary, &config);

    assert!(report.ingredients_over_limit());
    assert!(report.spirits_over_limit());
    assert!(report.is_over_budget());
    assert_eq!(report.ingredient_excess(), 3);
    assert_eq!(report.spirit_excess(), 1);
    assert_eq!(report.ingredient_percent(), 100.0);
    assert_eq!(report.spirit_percent(), 100.0);
}

#[test]
fn zero_limits() {
    let config = AppConfig {
        max_ingredients: 0,
        max_liquors: 0,
    };
    let empty = BudgetReport::check(&IngredientSummary::default(), &config);
    assert_eq!(empty.ingredient_percent(), 0.0);
    assert!(!empty.is_over_budget());

    let summary = ingredient_stats(&[screwdriver()]);
    let report = BudgetReport::check(&summary, &config);
    assert_eq!(report.spirit_percent(), 100.0);
    assert!(report.is_over_budget());
}

// ---------------------------------------------------------------------------
// Vote tally
// ---------------------------------------------------------------------------

fn voted_state() -> AppState {
    let mut state = AppState::default();
    state.shortlist = vec!["a".into(), "b".into(), "c".into()];
    let votes = [
        ("u1", vec!["b", "c"]),
        ("u2", vec!["c"]),
        ("u3", vec!["a"]),
        ("u4", vec!["z"]),
        ("u5", vec!["y"]),
    ];
    for (user, ids) in votes {
        state.votes_by_user.insert(
            user.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
    }
    state
}

#[test]
fn tally_orders_by_votes_then_shortlist_then_id() {
    let tally = vote_tally(&voted_state());
    let order: Vec<(&str, usize)> = tally
        .iter()
        .map(|t| (t.cocktail_id.as_str(), t.votes))
        .collect();
    assert_eq!(
        order,
        vec![("c", 2), ("a", 1), ("b", 1), ("y", 1), ("z", 1)]
    );
}

#[test]
fn tally_of_empty_state_is_empty() {
    assert!(vote_tally(&AppState::default()).is_empty());
}

#[test]
fn member_count_ignores_empty_vote_lists() {
    let mut state = voted_state();
    assert_eq!(member_count(&state), 5);
    state.votes_by_user.insert("u6".into(), Vec::new());
    assert_eq!(member_count(&state), 5);
}
