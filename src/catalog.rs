//! Read-only client for TheCocktailDB with an in-memory cocktail cache.
//!
//! Every cocktail returned by a search or lookup is cached by id for the
//! lifetime of the client (or until [`CatalogClient::clear_cache`]), so
//! repeated lookups of shortlist entries cost one request each at most.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config;
use crate::error::Result;
use crate::models::{CatalogDrink, Cocktail, DrinkRef};

/// Turn a catalog response body into cocktails.
///
/// The catalog answers "nothing found" with `"drinks": null` (or, for some
/// filters, a string), which reads as an empty list.
pub fn parse_drinks(body: &Value) -> Result<Vec<Cocktail>> {
    match body.get("drinks") {
        Some(Value::Array(drinks)) => drinks
            .iter()
            .map(|d| {
                let drink: CatalogDrink = serde_json::from_value(d.clone())?;
                Ok(Cocktail::from(drink))
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Turn a filter response body into cocktail ids.
pub fn parse_drink_ids(body: &Value) -> Result<Vec<String>> {
    match body.get("drinks") {
        Some(Value::Array(drinks)) => drinks
            .iter()
            .map(|d| {
                let drink: DrinkRef = serde_json::from_value(d.clone())?;
                Ok(drink.id)
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Fetches cocktails from the catalog and caches them by id.
pub struct CatalogClient {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
    cache: HashMap<String, Cocktail>,
}

impl CatalogClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: config::COCKTAILDB_BASE.to_string(),
            timeout,
            client: None,
            cache: HashMap::new(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<&Client> {
        let client = match self.client.take() {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };
        Ok(self.client.insert(client))
    }

    fn get_json(&mut self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "catalog request");
        let client = self.client()?.clone();
        let resp = client.get(&url).query(query).send()?.error_for_status()?;
        Ok(resp.json()?)
    }

    fn remember(&mut self, cocktails: &[Cocktail]) {
        for cocktail in cocktails {
            self.cache.insert(cocktail.id.clone(), cocktail.clone());
        }
    }

    // -- Cache -------------------------------------------------------------

    pub fn cached(&self, id: &str) -> Option<&Cocktail> {
        self.cache.get(id)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Seed the cache, e.g. with cocktails loaded from elsewhere.
    pub fn insert(&mut self, cocktail: Cocktail) {
        self.cache.insert(cocktail.id.clone(), cocktail);
    }

    pub fn clear_cache(&mut self) {
        debug!(entries = self.cache.len(), "clearing cocktail cache");
        self.cache.clear();
    }

    // -- Lookups -----------------------------------------------------------

    /// Cocktails whose name contains `query`. A blank query returns nothing.
    pub fn search_by_name(&mut self, query: &str) -> Result<Vec<Cocktail>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.get_json("search.php", &[("s", query)])?;
        let cocktails = parse_drinks(&body)?;
        self.remember(&cocktails);
        Ok(cocktails)
    }

    /// Every cocktail whose name starts with `letter`.
    pub fn browse_by_first_letter(&mut self, letter: char) -> Result<Vec<Cocktail>> {
        if !letter.is_ascii_alphanumeric() {
            return Ok(Vec::new());
        }
        let letter = letter.to_ascii_lowercase().to_string();
        let body = self.get_json("search.php", &[("f", &letter)])?;
        let cocktails = parse_drinks(&body)?;
        self.remember(&cocktails);
        Ok(cocktails)
    }

    /// A single cocktail by id, from the cache when possible.
    pub fn lookup_by_id(&mut self, id: &str) -> Result<Option<Cocktail>> {
        if let Some(cocktail) = self.cache.get(id) {
            return Ok(Some(cocktail.clone()));
        }
        let body = self.get_json("lookup.php", &[("i", id)])?;
        let cocktail = parse_drinks(&body)?.into_iter().next();
        if let Some(c) = &cocktail {
            self.cache.insert(c.id.clone(), c.clone());
        }
        Ok(cocktail)
    }

    /// Cocktails for `ids`, in input order.
    ///
    /// Unknown ids and ids whose lookup fails are skipped, so one bad entry
    /// never hides the rest of a shortlist.
    pub fn lookup_many(&mut self, ids: &[String]) -> Vec<Cocktail> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match self.lookup_by_id(id) {
                Ok(Some(cocktail)) => out.push(cocktail),
                Ok(None) => debug!(%id, "cocktail not in catalog"),
                Err(e) => warn!(%id, error = %e, "failed to fetch cocktail"),
            }
        }
        out
    }

    // -- Filters -----------------------------------------------------------

    /// Ids of cocktails that use `ingredient`.
    pub fn filter_ids_by_ingredient(&mut self, ingredient: &str) -> Result<Vec<String>> {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.get_json("filter.php", &[("i", ingredient)])?;
        parse_drink_ids(&body)
    }

    /// Ids of cocktails that use every one of `ingredients`.
    pub fn filter_ids_by_ingredients(&mut self, ingredients: &[&str]) -> Result<Vec<String>> {
        let Some((first, rest)) = ingredients.split_first() else {
            return Ok(Vec::new());
        };
        let mut ids = self.filter_ids_by_ingredient(first)?;
        for ingredient in rest {
            if ids.is_empty() {
                break;
            }
            let other: HashSet<String> = self.filter_ids_by_ingredient(ingredient)?.into_iter().collect();
            ids.retain(|id| other.contains(id));
        }
        Ok(ids)
    }

    /// Ids of alcoholic (`true`) or non-alcoholic (`false`) cocktails.
    pub fn filter_ids_by_alcoholic(&mut self, alcoholic: bool) -> Result<Vec<String>> {
        let flag = if alcoholic { "Alcoholic" } else { "Non_Alcoholic" };
        let body = self.get_json("filter.php", &[("a", flag)])?;
        parse_drink_ids(&body)
    }

    /// Full cocktails that use `ingredient`.
    pub fn cocktails_by_ingredient(&mut self, ingredient: &str) -> Result<Vec<Cocktail>> {
        let ids = self.filter_ids_by_ingredient(ingredient)?;
        Ok(self.lookup_many(&ids))
    }

    /// Name search, optionally restricted to (non-)alcoholic cocktails.
    pub fn search_with_filter(&mut self, query: &str, alcoholic: Option<bool>) -> Result<Vec<Cocktail>> {
        let results = self.search_by_name(query)?;
        let Some(flag) = alcoholic else {
            return Ok(results);
        };
        if results.is_empty() {
            return Ok(results);
        }
        let allowed: HashSet<String> = self.filter_ids_by_alcoholic(flag)?.into_iter().collect();
        Ok(results
            .into_iter()
            .filter(|c| allowed.contains(&c.id))
            .collect())
    }

    /// A handful of well-known cocktails, used to seed a local-only session.
    ///
    /// Searches that fail are skipped.
    pub fn popular_cocktails(&mut self) -> Vec<Cocktail> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for term in config::POPULAR_SEARCHES {
            match self.search_by_name(term) {
                Ok(results) => {
                    for cocktail in results.into_iter().take(config::POPULAR_PER_SEARCH) {
                        if seen.insert(cocktail.id.clone()) {
                            out.push(cocktail);
                        }
                    }
                }
                Err(e) => warn!(term, error = %e, "failed to fetch popular cocktails"),
            }
        }
        out
    }

    /// Drop the HTTP client; it is rebuilt on next use.
    pub fn close(&mut self) {
        self.client = None;
    }
}
