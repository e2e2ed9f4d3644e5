use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// TheCocktailDB spreads a drink's recipe over numbered columns up to this index.
pub const MAX_INGREDIENT_SLOTS: usize = 15;

// ---------------------------------------------------------------------------
// Cocktail: the normalized catalog record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    pub measure: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, measure: Option<&str>) -> Self {
        Self {
            name: name.into(),
            measure: measure.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cocktail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub alcoholic: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub glass: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// CatalogDrink: raw TheCocktailDB record
// ---------------------------------------------------------------------------

/// A drink exactly as TheCocktailDB returns it.
///
/// The numbered `strIngredientN` / `strMeasureN` columns are collected into
/// `slots` rather than spelled out as thirty fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDrink {
    #[serde(rename = "idDrink")]
    pub id: String,
    #[serde(rename = "strDrink", default)]
    pub name: Option<String>,
    #[serde(rename = "strTags", default)]
    pub tags: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strAlcoholic", default)]
    pub alcoholic: Option<String>,
    #[serde(rename = "strGlass", default)]
    pub glass: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strDrinkThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(flatten)]
    pub slots: HashMap<String, Value>,
}

impl CatalogDrink {
    fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).and_then(|v| v.as_str())
    }

    /// Non-blank ingredients in slot order, each with its trimmed measure.
    pub fn ingredients(&self) -> Vec<Ingredient> {
        (1..=MAX_INGREDIENT_SLOTS)
            .filter_map(|i| {
                let name = self.slot(&format!("strIngredient{i}"))?.trim();
                if name.is_empty() {
                    return None;
                }
                let measure = self.slot(&format!("strMeasure{i}")).map(str::trim);
                Some(Ingredient::new(name, measure))
            })
            .collect()
    }
}

impl From<CatalogDrink> for Cocktail {
    fn from(drink: CatalogDrink) -> Self {
        let ingredients = drink.ingredients();
        let tags = drink
            .tags
            .as_deref()
            .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        Cocktail {
            ingredients,
            tags,
            alcoholic: drink.alcoholic.as_deref() == Some("Alcoholic"),
            id: drink.id,
            name: drink.name.unwrap_or_default(),
            thumbnail: drink.thumbnail.unwrap_or_default(),
            category: drink.category.unwrap_or_default(),
            glass: drink.glass.unwrap_or_default(),
            instructions: drink.instructions.unwrap_or_default(),
        }
    }
}

/// Minimal record returned by the catalog's filter endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DrinkRef {
    #[serde(rename = "idDrink")]
    pub id: String,
}
