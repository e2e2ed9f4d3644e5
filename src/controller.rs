//! Optimistic mutation of the shared party state.
//!
//! Every change goes through the same lifecycle:
//!
//! 1. [`begin`](AppStateController::begin) validates the request, records the
//!    current value of the one field it touches, and applies the change to the
//!    local document immediately.
//! 2. [`PendingMutation::persist`] runs the read-merge-write round trip
//!    against the [`RemoteStateStore`], recomputing the patch from the freshest
//!    remote snapshot on every attempt.
//! 3. [`settle`](AppStateController::settle) either adopts the document the
//!    remote confirmed or restores the recorded field.
//!
//! The blocking helpers ([`toggle_vote`](AppStateController::toggle_vote) and
//! friends) run all three steps back to back. Callers that must not hold the
//! controller during the round trip (see the `async` feature) drive the steps
//! themselves.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config;
use crate::error::{PartyError, Result};
use crate::models::{AppConfig, AppState, StatePatch};
use crate::store::{RemoteStateStore, StateBackend};

// ---------------------------------------------------------------------------
// Public request / result types
// ---------------------------------------------------------------------------

/// Whether mutations reach the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Connected,
    /// No usable credentials: changes live in memory for this session only.
    LocalOnly,
}

/// How a successful mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Persisted; the local document is the one the remote confirmed.
    Committed,
    /// Applied locally only because no remote store is configured.
    LocalOnly,
}

/// Result of [`AppStateController::set_user_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAssignment {
    /// The stored name, possibly disambiguated with a `" (n)"` suffix.
    pub name: String,
    pub outcome: MutationOutcome,
}

/// A change a caller asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ToggleVote { user_id: String, cocktail_id: String },
    SetShortlist(Vec<String>),
    SetTags { cocktail_id: String, tags: Vec<String> },
    SetConfig(AppConfig),
    SetUserName { user_id: String, name: String },
}

/// The logical field a mutation touches. At most one mutation per key may be
/// pending at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey {
    Vote { user_id: String, cocktail_id: String },
    Shortlist,
    Tags(String),
    Config,
    UserName(String),
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKey::Vote {
                user_id,
                cocktail_id,
            } => write!(f, "vote of {user_id} on {cocktail_id}"),
            MutationKey::Shortlist => write!(f, "shortlist"),
            MutationKey::Tags(id) => write!(f, "tags of {id}"),
            MutationKey::Config => write!(f, "config"),
            MutationKey::UserName(id) => write!(f, "name of {id}"),
        }
    }
}

/// Identifies one refresh so a result arriving after the view moved on can be
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

// ---------------------------------------------------------------------------
// Intent: a validated mutation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Intent {
    Vote {
        user_id: String,
        cocktail_id: String,
        voted: bool,
    },
    Shortlist(Vec<String>),
    Tags {
        cocktail_id: String,
        tags: Vec<String>,
    },
    Config(AppConfig),
    UserName {
        user_id: String,
        requested: String,
    },
}

impl Intent {
    fn key(&self) -> MutationKey {
        match self {
            Intent::Vote {
                user_id,
                cocktail_id,
                ..
            } => MutationKey::Vote {
                user_id: user_id.clone(),
                cocktail_id: cocktail_id.clone(),
            },
            Intent::Shortlist(_) => MutationKey::Shortlist,
            Intent::Tags { cocktail_id, .. } => MutationKey::Tags(cocktail_id.clone()),
            Intent::Config(_) => MutationKey::Config,
            Intent::UserName { user_id, .. } => MutationKey::UserName(user_id.clone()),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            Intent::Vote { voted: true, .. } => "save vote",
            Intent::Vote { voted: false, .. } => "remove vote",
            Intent::Shortlist(_) => "update shortlist",
            Intent::Tags { .. } => "update tags",
            Intent::Config(_) => "update config",
            Intent::UserName { .. } => "save name",
        }
    }

    fn apply(&self, state: &mut AppState) {
        match self {
            Intent::Vote {
                user_id,
                cocktail_id,
                voted,
            } => state.set_vote(user_id, cocktail_id, *voted),
            Intent::Shortlist(ids) => state.shortlist = ids.clone(),
            Intent::Tags { cocktail_id, tags } => state.set_tags(cocktail_id, tags.clone()),
            Intent::Config(config) => state.config = *config,
            Intent::UserName { user_id, requested } => {
                let name = unique_display_name(&state.users, user_id, requested);
                state.users.insert(user_id.clone(), name);
            }
        }
    }

    /// The patch that carries this change on top of `latest`.
    fn patch(&self, latest: &AppState) -> StatePatch {
        let mut next = latest.clone();
        self.apply(&mut next);
        match self {
            Intent::Vote { .. } => StatePatch {
                votes_by_user: Some(next.votes_by_user),
                ..StatePatch::default()
            },
            Intent::Shortlist(_) => StatePatch {
                shortlist: Some(next.shortlist),
                ..StatePatch::default()
            },
            Intent::Tags { .. } => StatePatch {
                tags_by_cocktail: Some(next.tags_by_cocktail),
                ..StatePatch::default()
            },
            Intent::Config(_) => StatePatch {
                config: Some(next.config),
                ..StatePatch::default()
            },
            Intent::UserName { .. } => StatePatch {
                users: Some(next.users),
                ..StatePatch::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot: the pre-mutation value of the touched field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Snapshot {
    Vote {
        user_id: String,
        cocktail_id: String,
        voted: bool,
    },
    Shortlist(Vec<String>),
    Tags {
        cocktail_id: String,
        tags: Vec<String>,
    },
    Config(AppConfig),
    UserName {
        user_id: String,
        name: Option<String>,
    },
}

impl Snapshot {
    fn capture(intent: &Intent, state: &AppState) -> Self {
        match intent {
            Intent::Vote {
                user_id,
                cocktail_id,
                ..
            } => Snapshot::Vote {
                user_id: user_id.clone(),
                cocktail_id: cocktail_id.clone(),
                voted: state.has_voted(user_id, cocktail_id),
            },
            Intent::Shortlist(_) => Snapshot::Shortlist(state.shortlist.clone()),
            Intent::Tags { cocktail_id, .. } => Snapshot::Tags {
                cocktail_id: cocktail_id.clone(),
                tags: state.tags_for(cocktail_id).to_vec(),
            },
            Intent::Config(_) => Snapshot::Config(state.config),
            Intent::UserName { user_id, .. } => Snapshot::UserName {
                user_id: user_id.clone(),
                name: state.users.get(user_id).cloned(),
            },
        }
    }

    fn restore(self, state: &mut AppState) {
        match self {
            Snapshot::Vote {
                user_id,
                cocktail_id,
                voted,
            } => state.set_vote(&user_id, &cocktail_id, voted),
            Snapshot::Shortlist(ids) => state.shortlist = ids,
            Snapshot::Tags { cocktail_id, tags } => state.set_tags(&cocktail_id, tags),
            Snapshot::Config(config) => state.config = config,
            Snapshot::UserName { user_id, name } => match name {
                Some(name) => {
                    state.users.insert(user_id, name);
                }
                None => {
                    state.users.remove(&user_id);
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PendingMutation
// ---------------------------------------------------------------------------

/// A mutation applied locally and waiting for its remote write.
///
/// Hand it back to [`AppStateController::settle`] with the result of
/// [`persist`](Self::persist), whatever that result is.
#[derive(Debug)]
#[must_use = "a pending mutation must be settled"]
pub struct PendingMutation {
    intent: Intent,
    snapshot: Snapshot,
}

impl PendingMutation {
    pub fn key(&self) -> MutationKey {
        self.intent.key()
    }

    /// Short human-readable verb phrase, e.g. `"update tags"`.
    pub fn action(&self) -> &'static str {
        self.intent.action()
    }

    /// Write this change through `store`, retrying transient failures.
    ///
    /// Only needs the store, so it can run while the controller is free.
    pub fn persist<B: StateBackend>(&self, store: &RemoteStateStore<B>) -> Result<AppState> {
        store.update_with_retry(|latest| self.intent.patch(latest))
    }
}

// ---------------------------------------------------------------------------
// AppStateController
// ---------------------------------------------------------------------------

/// Owns the local copy of the party document and keeps it in step with the
/// remote one.
pub struct AppStateController<B> {
    store: RemoteStateStore<B>,
    mode: SyncMode,
    state: AppState,
    pending: Vec<Intent>,
    fetch_generation: u64,
}

impl<B: StateBackend> AppStateController<B> {
    /// Create a controller starting from the default document.
    ///
    /// The sync mode is fixed here: an unconfigured store makes every later
    /// mutation local-only.
    pub fn new(store: RemoteStateStore<B>) -> Self {
        let mode = if store.configured() {
            SyncMode::Connected
        } else {
            info!("no remote store configured, changes stay local to this session");
            SyncMode::LocalOnly
        };
        Self {
            store,
            mode,
            state: AppState::default(),
            pending: Vec::new(),
            fetch_generation: 0,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_local_only(&self) -> bool {
        self.mode == SyncMode::LocalOnly
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &RemoteStateStore<B> {
        &self.store
    }

    /// Keys of mutations applied locally and not yet settled.
    pub fn pending_keys(&self) -> Vec<MutationKey> {
        self.pending.iter().map(Intent::key).collect()
    }

    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.pending.iter().any(|i| &i.key() == key)
    }

    // -- Reads -------------------------------------------------------------

    pub fn has_voted(&self, user_id: &str, cocktail_id: &str) -> bool {
        self.state.has_voted(user_id, cocktail_id)
    }

    pub fn vote_count(&self, cocktail_id: &str) -> usize {
        self.state.vote_count(cocktail_id)
    }

    pub fn display_name(&self, user_id: &str) -> Option<&str> {
        self.state.display_name(user_id)
    }

    // -- Refresh -----------------------------------------------------------

    /// Replace the local document with the remote one.
    ///
    /// Local-only controllers have nothing to fetch and keep their state.
    /// Mutations still pending are re-applied on top of the fetched document.
    pub fn refresh(&mut self) -> Result<()> {
        if self.is_local_only() {
            return Ok(());
        }
        let ticket = self.begin_fetch();
        let result = self.store.fetch();
        self.complete_fetch(ticket, result).map(|_| ())
    }

    /// Start a fetch, invalidating any fetch started before.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        FetchTicket(self.fetch_generation)
    }

    /// Invalidate every outstanding fetch, e.g. when the view that asked for it
    /// goes away.
    pub fn cancel_fetches(&mut self) {
        self.fetch_generation += 1;
    }

    /// Apply the result of a fetch started with [`begin_fetch`](Self::begin_fetch).
    ///
    /// Returns `Ok(false)` without touching state when the ticket has been
    /// superseded or cancelled.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<AppState>) -> Result<bool> {
        if ticket.0 != self.fetch_generation {
            debug!("discarding result of a cancelled fetch");
            return Ok(false);
        }
        self.adopt(result?);
        Ok(true)
    }

    /// Start a local-only session from a fresh document whose shortlist is `ids`.
    pub fn seed_local_shortlist(&mut self, ids: Vec<String>) {
        self.state = AppState {
            shortlist: normalize_list(ids),
            ..AppState::default()
        };
    }

    fn adopt(&mut self, state: AppState) {
        self.state = state;
        for intent in &self.pending {
            intent.apply(&mut self.state);
        }
    }

    // -- Mutation lifecycle ------------------------------------------------

    /// Validate `mutation` and apply it to the local document.
    ///
    /// Returns `Ok(None)` when the controller is local-only: the change stays
    /// applied and there is nothing to persist. Otherwise the returned
    /// [`PendingMutation`] must be persisted and settled.
    ///
    /// Fails without changing anything when the request is invalid, when a
    /// vote is cast by a user without a display name, or when a mutation of
    /// the same key is still pending.
    pub fn begin(&mut self, mutation: Mutation) -> Result<Option<PendingMutation>> {
        let intent = self.resolve(mutation)?;
        let key = intent.key();
        if self.is_pending(&key) {
            return Err(PartyError::MutationPending(key.to_string()));
        }

        let snapshot = Snapshot::capture(&intent, &self.state);
        intent.apply(&mut self.state);

        match self.mode {
            SyncMode::LocalOnly => {
                info!(key = %key, "applied locally only, no remote store configured");
                Ok(None)
            }
            SyncMode::Connected => {
                self.pending.push(intent.clone());
                Ok(Some(PendingMutation { intent, snapshot }))
            }
        }
    }

    /// Finish a mutation with the result of its persist step.
    ///
    /// On success the confirmed document replaces the local one (with other
    /// pending changes re-applied). On failure only the field this mutation
    /// touched goes back to its earlier value.
    pub fn settle(
        &mut self,
        pending: PendingMutation,
        result: Result<AppState>,
    ) -> Result<MutationOutcome> {
        let PendingMutation { intent, snapshot } = pending;
        let key = intent.key();
        self.pending.retain(|i| i.key() != key);

        match result {
            Ok(confirmed) => {
                self.adopt(confirmed);
                debug!(key = %key, "mutation committed");
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                snapshot.restore(&mut self.state);
                warn!(key = %key, error = %e, "mutation failed, rolled back");
                Err(PartyError::MutationFailed {
                    action: intent.action(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Run a mutation through its whole lifecycle.
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome> {
        match self.begin(mutation)? {
            None => Ok(MutationOutcome::LocalOnly),
            Some(pending) => {
                let result = pending.persist(&self.store);
                self.settle(pending, result)
            }
        }
    }

    // -- Mutations ---------------------------------------------------------

    /// Add `cocktail_id` to the user's votes, or remove it if already there.
    pub fn toggle_vote(&mut self, user_id: &str, cocktail_id: &str) -> Result<MutationOutcome> {
        self.apply(Mutation::ToggleVote {
            user_id: user_id.to_string(),
            cocktail_id: cocktail_id.to_string(),
        })
    }

    /// Replace the shortlist. Blank and repeated ids are dropped.
    pub fn set_shortlist(&mut self, ids: Vec<String>) -> Result<MutationOutcome> {
        self.apply(Mutation::SetShortlist(ids))
    }

    /// Replace a cocktail's tags. An empty list clears them.
    pub fn set_tags(&mut self, cocktail_id: &str, tags: Vec<String>) -> Result<MutationOutcome> {
        self.apply(Mutation::SetTags {
            cocktail_id: cocktail_id.to_string(),
            tags,
        })
    }

    pub fn set_config(&mut self, config: AppConfig) -> Result<MutationOutcome> {
        self.apply(Mutation::SetConfig(config))
    }

    /// Register a display name, made unique against every other user.
    pub fn set_user_name(&mut self, user_id: &str, name: &str) -> Result<NameAssignment> {
        let outcome = self.apply(Mutation::SetUserName {
            user_id: user_id.to_string(),
            name: name.to_string(),
        })?;
        let name = self
            .state
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        Ok(NameAssignment { name, outcome })
    }

    fn resolve(&self, mutation: Mutation) -> Result<Intent> {
        match mutation {
            Mutation::ToggleVote {
                user_id,
                cocktail_id,
            } => {
                let cocktail_id = cocktail_id.trim().to_string();
                if cocktail_id.is_empty() {
                    return Err(PartyError::InvalidArgument("cocktail id is empty".into()));
                }
                if self.state.display_name(&user_id).is_none() {
                    return Err(PartyError::NameRequired(
                        "Please select or enter your name to vote".into(),
                    ));
                }
                let voted = !self.state.has_voted(&user_id, &cocktail_id);
                Ok(Intent::Vote {
                    user_id,
                    cocktail_id,
                    voted,
                })
            }
            Mutation::SetShortlist(ids) => Ok(Intent::Shortlist(normalize_list(ids))),
            Mutation::SetTags { cocktail_id, tags } => {
                let cocktail_id = cocktail_id.trim().to_string();
                if cocktail_id.is_empty() {
                    return Err(PartyError::InvalidArgument("cocktail id is empty".into()));
                }
                Ok(Intent::Tags {
                    cocktail_id,
                    tags: normalize_list(tags),
                })
            }
            Mutation::SetConfig(config) => Ok(Intent::Config(config)),
            Mutation::SetUserName { user_id, name } => {
                let requested = name.trim();
                if requested.is_empty() {
                    return Err(PartyError::InvalidArgument("name cannot be empty".into()));
                }
                if requested.chars().count() > config::MAX_NAME_LEN {
                    return Err(PartyError::InvalidArgument(format!(
                        "name must be at most {} characters",
                        config::MAX_NAME_LEN
                    )));
                }
                Ok(Intent::UserName {
                    user_id,
                    requested: requested.to_string(),
                })
            }
        }
    }
}

impl<B> fmt::Debug for AppStateController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppStateController")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trim entries, drop blanks, and keep only the first of any repeats.
fn normalize_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|o| o == item) {
            out.push(item.to_string());
        }
    }
    out
}

/// The existing name another user holds that equals `candidate`, ignoring
/// case and surrounding whitespace.
fn taken_by_other<'a>(
    users: &'a BTreeMap<String, String>,
    user_id: &str,
    candidate: &str,
) -> Option<&'a str> {
    let wanted = candidate.trim().to_lowercase();
    users
        .iter()
        .filter(|(id, _)| id.as_str() != user_id)
        .map(|(_, name)| name.trim())
        .find(|name| name.to_lowercase() == wanted)
}

/// Make `requested` unique among the names of users other than `user_id`.
///
/// A clash adopts the spelling already in use and appends `" (2)"`, `" (3)"`,
/// and so on until no other user holds the result.
pub fn unique_display_name(
    users: &BTreeMap<String, String>,
    user_id: &str,
    requested: &str,
) -> String {
    let requested = requested.trim();
    let stem = match taken_by_other(users, user_id, requested) {
        None => return requested.to_string(),
        Some(existing) => existing.to_string(),
    };

    let mut n = 2u32;
    loop {
        let candidate = format!("{stem} ({n})");
        if taken_by_other(users, user_id, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}
