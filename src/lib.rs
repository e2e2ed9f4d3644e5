//! Core of a cocktail party voting app.
//!
//! Guests browse an admin-curated shortlist of cocktails, vote and tag, and see
//! the combined shopping list for the cocktails that won votes. The shared
//! party state is one JSON document in a JSONBin bin; cocktail data comes from
//! TheCocktailDB.
//!
//! # Quick start
//!
//! ```no_run
//! use cocktail_party::{CocktailParty, StoreConfig};
//!
//! let mut party = CocktailParty::builder()
//!     .store_config(StoreConfig::new("my-bin-id", "my-access-key"))
//!     .build()
//!     .unwrap();
//! party.refresh().unwrap();
//!
//! let me = "u_lx3k9a2b7c1d";
//! party.controller_mut().set_user_name(me, "Alex").unwrap();
//! party.controller_mut().toggle_vote(me, "11007").unwrap();
//!
//! for line in party.shopping_list().ingredients {
//!     println!("{} {:?}", line.name, line.measure.map(|m| m.display));
//! }
//! ```
//!
//! Without usable credentials the party runs local-only: every change applies
//! in memory for the session and nothing is persisted.

#[cfg(feature = "async")]
pub mod async_client;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod measure;
pub mod models;
pub mod similarity;
pub mod stats;
pub mod store;

#[cfg(feature = "async")]
pub use async_client::AsyncPartyController;
pub use catalog::CatalogClient;
pub use config::StoreConfig;
pub use controller::{
    AppStateController, Mutation, MutationKey, MutationOutcome, NameAssignment, PendingMutation,
    SyncMode,
};
pub use error::{PartyError, Result};
pub use identity::LocalIdentity;
pub use measure::{aggregate_measures, parse_measure, AggregatedMeasure, ParsedMeasure};
pub use models::{AppConfig, AppState, Cocktail, Ingredient, StatePatch};
pub use similarity::{find_similar, similarity};
pub use store::{JsonBinBackend, MemoryBackend, RemoteStateStore, RetryPolicy, StateBackend};

use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::stats::{BudgetReport, IngredientSummary};

// ---------------------------------------------------------------------------
// CocktailPartyBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`CocktailParty`].
///
/// Use [`CocktailParty::builder()`] to obtain one.
pub struct CocktailPartyBuilder {
    store_config: Option<StoreConfig>,
    timeout: Duration,
    retry: RetryPolicy,
    jsonbin_base: Option<String>,
    catalog_base: Option<String>,
}

impl Default for CocktailPartyBuilder {
    fn default() -> Self {
        Self {
            store_config: None,
            timeout: config::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            jsonbin_base: None,
            catalog_base: None,
        }
    }
}

impl CocktailPartyBuilder {
    /// Credentials for the shared document. Without them (or with the
    /// placeholder values) the party runs local-only.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = Some(config);
        self
    }

    /// Take credentials from `COCKTAIL_PARTY_BIN_ID` / `COCKTAIL_PARTY_ACCESS_KEY`
    /// when both are set.
    pub fn store_config_from_env(mut self) -> Self {
        self.store_config = StoreConfig::from_env();
        self
    }

    /// HTTP timeout for both the catalog and the store. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry policy for remote writes. Defaults to 2 retries, 500 ms apart.
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn jsonbin_base_url(mut self, url: impl Into<String>) -> Self {
        self.jsonbin_base = Some(url.into());
        self
    }

    pub fn catalog_base_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_base = Some(url.into());
        self
    }

    /// Build the party. No request is made until the first refresh or lookup.
    pub fn build(self) -> Result<CocktailParty> {
        let mut backend = JsonBinBackend::new(self.store_config, self.timeout)?;
        if let Some(url) = self.jsonbin_base {
            backend = backend.with_base_url(url);
        }
        let store = RemoteStateStore::new(backend).with_retry_policy(self.retry);

        let mut catalog = CatalogClient::new(self.timeout);
        if let Some(url) = self.catalog_base {
            catalog = catalog.with_base_url(url);
        }

        Ok(CocktailParty {
            catalog,
            controller: AppStateController::new(store),
        })
    }
}

// ---------------------------------------------------------------------------
// CocktailParty
// ---------------------------------------------------------------------------

/// The catalog and the shared party state, wired together.
pub struct CocktailParty {
    catalog: CatalogClient,
    controller: AppStateController<JsonBinBackend>,
}

impl CocktailParty {
    pub fn builder() -> CocktailPartyBuilder {
        CocktailPartyBuilder::default()
    }

    pub fn catalog(&mut self) -> &mut CatalogClient {
        &mut self.catalog
    }

    pub fn controller(&self) -> &AppStateController<JsonBinBackend> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AppStateController<JsonBinBackend> {
        &mut self.controller
    }

    pub fn state(&self) -> &AppState {
        self.controller.state()
    }

    /// Reload the shared state.
    ///
    /// A local-only party with an empty shortlist is seeded with popular
    /// cocktails from the catalog instead.
    pub fn refresh(&mut self) -> Result<()> {
        if self.controller.is_local_only() {
            if self.controller.state().shortlist.is_empty() {
                let ids = self
                    .catalog
                    .popular_cocktails()
                    .into_iter()
                    .map(|c| c.id)
                    .collect::<Vec<_>>();
                info!(count = ids.len(), "seeded local shortlist with popular cocktails");
                self.controller.seed_local_shortlist(ids);
            }
            return Ok(());
        }
        self.controller.refresh()
    }

    /// The shortlist as full cocktails, in shortlist order.
    pub fn shortlisted_cocktails(&mut self) -> Vec<Cocktail> {
        let ids = self.controller.state().shortlist.clone();
        self.catalog.lookup_many(&ids)
    }

    /// Cocktails with at least one vote, most voted first, with their counts.
    pub fn voted_cocktails(&mut self) -> Vec<(Cocktail, usize)> {
        let tally = stats::vote_tally(self.controller.state());
        let ids: Vec<String> = tally.iter().map(|t| t.cocktail_id.clone()).collect();
        let cocktails = self.catalog.lookup_many(&ids);
        tally
            .into_iter()
            .filter_map(|t| {
                cocktails
                    .iter()
                    .find(|c| c.id == t.cocktail_id)
                    .map(|c| (c.clone(), t.votes))
            })
            .collect()
    }

    /// Everything needed to make the voted-for cocktails.
    pub fn shopping_list(&mut self) -> IngredientSummary {
        let cocktails: Vec<Cocktail> = self
            .voted_cocktails()
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        stats::ingredient_stats(&cocktails)
    }

    /// The shopping list measured against the admin's limits.
    pub fn budget(&mut self) -> BudgetReport {
        let summary = self.shopping_list();
        BudgetReport::check(&summary, &self.controller.state().config)
    }

    /// Shortlisted cocktails most similar to `cocktail_id`.
    pub fn similar_to(&mut self, cocktail_id: &str, limit: usize) -> Result<Vec<Cocktail>> {
        let Some(target) = self.catalog.lookup_by_id(cocktail_id)? else {
            return Ok(Vec::new());
        };
        let candidates = self.shortlisted_cocktails();
        Ok(find_similar(&target, &candidates, limit)
            .into_iter()
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CocktailParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.controller.state();
        write!(
            f,
            "CocktailParty(mode={:?}, shortlist={}, voters={}, cached_cocktails={})",
            self.controller.mode(),
            state.shortlist.len(),
            stats::member_count(state),
            self.catalog.cache_len()
        )
    }
}
