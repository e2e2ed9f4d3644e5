use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Admin-set budget thresholds. Advisory only: exceeding them warns, never blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub max_ingredients: u32,
    pub max_liquors: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_ingredients: config::DEFAULT_MAX_INGREDIENTS,
            max_liquors: config::DEFAULT_MAX_LIQUORS,
        }
    }
}

// ---------------------------------------------------------------------------
// AppState: the single shared document
// ---------------------------------------------------------------------------

/// The whole party document as stored remotely.
///
/// Missing fields in a remote record take their default value, so an older or
/// hand-edited document still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub shortlist: Vec<String>,
    pub votes_by_user: BTreeMap<String, Vec<String>>,
    pub tags_by_cocktail: BTreeMap<String, Vec<String>>,
    pub users: BTreeMap<String, String>,
    pub config: AppConfig,
}

impl AppState {
    /// Whether `user_id` currently votes for `cocktail_id`.
    pub fn has_voted(&self, user_id: &str, cocktail_id: &str) -> bool {
        self.votes_by_user
            .get(user_id)
            .is_some_and(|votes| votes.iter().any(|id| id == cocktail_id))
    }

    /// Number of distinct users whose vote list contains `cocktail_id`.
    pub fn vote_count(&self, cocktail_id: &str) -> usize {
        self.votes_by_user
            .values()
            .filter(|votes| votes.iter().any(|id| id == cocktail_id))
            .count()
    }

    /// The trimmed display name registered for `user_id`, if any.
    pub fn display_name(&self, user_id: &str) -> Option<&str> {
        self.users
            .get(user_id)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
    }

    pub fn tags_for(&self, cocktail_id: &str) -> &[String] {
        self.tags_by_cocktail
            .get(cocktail_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Add or remove one cocktail from a user's votes; empty lists are dropped.
    pub(crate) fn set_vote(&mut self, user_id: &str, cocktail_id: &str, voted: bool) {
        let votes = self.votes_by_user.entry(user_id.to_string()).or_default();
        votes.retain(|id| id != cocktail_id);
        if voted {
            votes.push(cocktail_id.to_string());
        }
        if votes.is_empty() {
            self.votes_by_user.remove(user_id);
        }
    }

    /// Replace a cocktail's tags; an empty set removes the entry.
    pub(crate) fn set_tags(&mut self, cocktail_id: &str, tags: Vec<String>) {
        if tags.is_empty() {
            self.tags_by_cocktail.remove(cocktail_id);
        } else {
            self.tags_by_cocktail.insert(cocktail_id.to_string(), tags);
        }
    }
}

// ---------------------------------------------------------------------------
// StatePatch: a partial document
// ---------------------------------------------------------------------------

/// The top-level fields one write intends to change.
///
/// Applying a patch replaces each present field wholesale; nested maps are not
/// merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortlist: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_by_user: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_by_cocktail: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<AppConfig>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        self.shortlist.is_none()
            && self.votes_by_user.is_none()
            && self.tags_by_cocktail.is_none()
            && self.users.is_none()
            && self.config.is_none()
    }

    /// Overlay this patch on `base`, returning the merged document.
    pub fn merged_over(self, base: &AppState) -> AppState {
        let mut merged = base.clone();
        if let Some(shortlist) = self.shortlist {
            merged.shortlist = shortlist;
        }
        if let Some(votes) = self.votes_by_user {
            merged.votes_by_user = votes;
        }
        if let Some(tags) = self.tags_by_cocktail {
            merged.tags_by_cocktail = tags;
        }
        if let Some(users) = self.users {
            merged.users = users;
        }
        if let Some(config) = self.config {
            merged.config = config;
        }
        merged
    }
}
