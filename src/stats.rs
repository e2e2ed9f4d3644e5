//! Shopping-list and party summaries derived from cocktails and votes.

use serde::Serialize;

use crate::config::BASE_SPIRITS;
use crate::measure::{aggregate_measures, AggregatedMeasure};
use crate::models::{AppConfig, AppState, Cocktail};

// ---------------------------------------------------------------------------
// Ingredient statistics
// ---------------------------------------------------------------------------

/// Whether an ingredient name refers to a base spirit.
///
/// Matches when the lowercased name contains a spirit word ("Light rum") or is
/// itself part of one ("Whisk").
pub fn is_base_spirit(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    BASE_SPIRITS
        .iter()
        .any(|spirit| normalized.contains(spirit) || spirit.contains(normalized.as_str()))
}

/// One line of the shopping list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientStats {
    /// Display name, as first seen.
    pub name: String,
    /// How many recipe lines use this ingredient.
    pub count: usize,
    pub is_spirit: bool,
    pub measure: Option<AggregatedMeasure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientSummary {
    /// Non-spirit ingredients, most used first.
    pub ingredients: Vec<IngredientStats>,
    /// Base spirits, most used first.
    pub spirits: Vec<IngredientStats>,
    pub total_ingredients: usize,
    pub total_spirits: usize,
}

struct Tally<'a> {
    key: String,
    name: &'a str,
    measures: Vec<Option<&'a str>>,
}

/// Aggregate every ingredient used by `cocktails`.
///
/// Ingredients are keyed by lowercased trimmed name; each carries the summed
/// measure of all its recipe lines.
pub fn ingredient_stats(cocktails: &[Cocktail]) -> IngredientSummary {
    let mut tallies: Vec<Tally<'_>> = Vec::new();
    for ingredient in cocktails.iter().flat_map(|c| &c.ingredients) {
        let key = ingredient.name.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let measure = ingredient.measure.as_deref();
        match tallies.iter_mut().find(|t| t.key == key) {
            Some(tally) => tally.measures.push(measure),
            None => tallies.push(Tally {
                key,
                name: ingredient.name.trim(),
                measures: vec![measure],
            }),
        }
    }

    let mut all: Vec<IngredientStats> = tallies
        .into_iter()
        .map(|t| IngredientStats {
            name: t.name.to_string(),
            count: t.measures.len(),
            is_spirit: is_base_spirit(&t.key),
            measure: aggregate_measures(&t.measures),
        })
        .collect();
    all.sort_by(|a, b| b.count.cmp(&a.count));

    let total_ingredients = all.len();
    let (spirits, ingredients): (Vec<_>, Vec<_>) = all.into_iter().partition(|i| i.is_spirit);

    IngredientSummary {
        total_spirits: spirits.len(),
        total_ingredients,
        ingredients,
        spirits,
    }
}

// ---------------------------------------------------------------------------
// Budget report
// ---------------------------------------------------------------------------

/// How a shopping list compares with the admin's advisory limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetReport {
    pub total_ingredients: usize,
    pub max_ingredients: u32,
    pub total_spirits: usize,
    pub max_liquors: u32,
}

impl BudgetReport {
    pub fn check(summary: &IngredientSummary, config: &AppConfig) -> Self {
        Self {
            total_ingredients: summary.total_ingredients,
            max_ingredients: config.max_ingredients,
            total_spirits: summary.total_spirits,
            max_liquors: config.max_liquors,
        }
    }

    pub fn ingredients_over_limit(&self) -> bool {
        self.total_ingredients > self.max_ingredients as usize
    }

    pub fn spirits_over_limit(&self) -> bool {
        self.total_spirits > self.max_liquors as usize
    }

    pub fn is_over_budget(&self) -> bool {
        self.ingredients_over_limit() || self.spirits_over_limit()
    }

    /// Ingredients beyond the limit, `0` when within it.
    pub fn ingredient_excess(&self) -> usize {
        self.total_ingredients
            .saturating_sub(self.max_ingredients as usize)
    }

    pub fn spirit_excess(&self) -> usize {
        self.total_spirits.saturating_sub(self.max_liquors as usize)
    }

    /// Share of the ingredient limit in use, capped at 100.
    pub fn ingredient_percent(&self) -> f64 {
        percent_of(self.total_ingredients, self.max_ingredients)
    }

    pub fn spirit_percent(&self) -> f64 {
        percent_of(self.total_spirits, self.max_liquors)
    }
}

fn percent_of(used: usize, limit: u32) -> f64 {
    if limit == 0 {
        return if used == 0 { 0.0 } else { 100.0 };
    }
    (used as f64 / limit as f64 * 100.0).min(100.0)
}

// ---------------------------------------------------------------------------
// Vote tally
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub cocktail_id: String,
    pub votes: usize,
}

/// Every cocktail with at least one vote, most votes first.
///
/// Ties are ordered by shortlist position, then cocktails off the shortlist by id.
pub fn vote_tally(state: &AppState) -> Vec<VoteTally> {
    let mut tally: Vec<VoteTally> = Vec::new();
    for id in state.votes_by_user.values().flatten() {
        if !tally.iter().any(|t| &t.cocktail_id == id) {
            tally.push(VoteTally {
                cocktail_id: id.clone(),
                votes: state.vote_count(id),
            });
        }
    }

    let position = |id: &str| {
        state
            .shortlist
            .iter()
            .position(|s| s == id)
            .unwrap_or(usize::MAX)
    };
    tally.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| position(&a.cocktail_id).cmp(&position(&b.cocktail_id)))
            .then_with(|| a.cocktail_id.cmp(&b.cocktail_id))
    });
    tally
}

/// Number of users who have voted for anything.
pub fn member_count(state: &AppState) -> usize {
    state
        .votes_by_user
        .values()
        .filter(|votes| !votes.is_empty())
        .count()
}
