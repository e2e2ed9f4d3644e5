use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

pub const JSONBIN_BASE: &str = "https://api.jsonbin.io/v3";
pub const COCKTAILDB_BASE: &str = "https://www.thecocktaildb.com/api/json/v1/1";

/// Placeholder values shipped in sample configuration; never treated as real credentials.
pub const PLACEHOLDER_BIN_ID: &str = "YOUR_BIN_ID";
pub const PLACEHOLDER_ACCESS_KEY: &str = "YOUR_ACCESS_KEY";

pub const BIN_ID_VAR: &str = "COCKTAIL_PARTY_BIN_ID";
pub const ACCESS_KEY_VAR: &str = "COCKTAIL_PARTY_ACCESS_KEY";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_MAX_INGREDIENTS: u32 = 30;
pub const DEFAULT_MAX_LIQUORS: u32 = 3;

pub const MAX_NAME_LEN: usize = 30;

/// Ingredient words that mark an ingredient as a base spirit.
pub const BASE_SPIRITS: &[&str] = &[
    "vodka", "gin", "rum", "tequila", "whiskey", "whisky", "bourbon", "brandy", "cognac",
    "scotch", "mezcal",
];

/// Controlled tag vocabulary offered alongside free-form tags.
pub const CUSTOM_TAGS: &[&str] = &[
    "sweet",
    "sour",
    "bitter",
    "refreshing",
    "citrusy",
    "creamy",
    "fruity",
    "spicy",
    "herbal",
    "smoky",
    "tropical",
    "classic",
];

/// Search terms used to seed the shortlist when no remote store is configured.
pub const POPULAR_SEARCHES: &[&str] = &["margarita", "mojito", "martini", "old fashioned", "daiquiri"];
pub const POPULAR_PER_SEARCH: usize = 4;

/// Credentials for the hosted JSON document holding the shared party state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub bin_id: String,
    pub access_key: String,
}

impl StoreConfig {
    pub fn new(bin_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            bin_id: bin_id.into().trim().to_string(),
            access_key: access_key.into().trim().to_string(),
        }
    }

    /// Read credentials from `COCKTAIL_PARTY_BIN_ID` and `COCKTAIL_PARTY_ACCESS_KEY`.
    ///
    /// Returns `None` when either variable is missing.
    pub fn from_env() -> Option<Self> {
        let bin_id = var(BIN_ID_VAR)?;
        let access_key = var(ACCESS_KEY_VAR)?;
        Some(Self::new(bin_id, access_key))
    }

    /// True when both values are present and neither is a placeholder.
    pub fn is_usable(&self) -> bool {
        !self.bin_id.is_empty()
            && !self.access_key.is_empty()
            && self.bin_id != PLACEHOLDER_BIN_ID
            && self.access_key != PLACEHOLDER_ACCESS_KEY
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) => Some(value),
        Err(env::VarError::NotPresent) => {
            debug!("{key} not set, running without a remote store");
            None
        }
        Err(e) => {
            warn!("Invalid {key} value: {e}");
            None
        }
    }
}

/// Where the local user id is kept between sessions.
pub fn default_identity_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        dir.join("cocktail-party").join("user_id")
    } else {
        PathBuf::from(".cocktail-party").join("user_id")
    }
}
