//! Ingredient-overlap similarity between cocktails.

use std::collections::HashSet;

use crate::models::Cocktail;

/// How many recommendations [`find_similar`] returns by default.
pub const DEFAULT_SIMILAR_LIMIT: usize = 4;

fn ingredient_names(cocktail: &Cocktail) -> HashSet<String> {
    cocktail
        .ingredients
        .iter()
        .map(|i| i.name.to_lowercase())
        .collect()
}

/// Jaccard index of the two cocktails' lowercased ingredient-name sets.
///
/// Measures and repeated ingredient lines are ignored. Two cocktails without
/// any ingredients have similarity `0`.
pub fn similarity(a: &Cocktail, b: &Cocktail) -> f64 {
    let left = ingredient_names(a);
    let right = ingredient_names(b);

    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let overlap = left.intersection(&right).count();
    overlap as f64 / union as f64
}

/// Rank `candidates` by similarity to `target`, most similar first.
///
/// The target itself (by id) and candidates sharing no ingredient are left
/// out. Ties keep their input order. At most `limit` cocktails are returned.
pub fn find_similar<'a>(
    target: &Cocktail,
    candidates: &'a [Cocktail],
    limit: usize,
) -> Vec<&'a Cocktail> {
    let mut scored: Vec<(f64, &Cocktail)> = candidates
        .iter()
        .filter(|c| c.id != target.id)
        .map(|c| (similarity(target, c), c))
        .filter(|(score, _)| *score > 0.0)
        .collect();

    // sort_by is stable, so equal scores stay in candidate order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored.into_iter().take(limit).map(|(_, c)| c).collect()
}
