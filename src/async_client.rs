//! Async wrapper around [`AppStateController`] for Tokio runtimes.
//!
//! Remote round trips run on Tokio's blocking pool via
//! [`tokio::task::spawn_blocking`]. The controller itself sits behind a
//! [`Mutex`] that is held only to begin and settle a mutation, never while the
//! write is in flight, so reads stay responsive and show optimistic changes
//! immediately.
//!
//! Writes from one handle (and its clones) go out one at a time: each
//! read-merge-write must see the document the previous one confirmed, or it
//! would put back a stale copy of fields it does not own.
//!
//! # Example
//!
//! ```no_run
//! use cocktail_party::{AppStateController, AsyncPartyController, MemoryBackend, RemoteStateStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = RemoteStateStore::new(MemoryBackend::new());
//!     let party = AsyncPartyController::new(AppStateController::new(store));
//!
//!     party.set_user_name("u_1", "Alex").await.unwrap();
//!     party.toggle_vote("u_1", "11007").await.unwrap();
//!     assert!(party.snapshot().unwrap().has_voted("u_1", "11007"));
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Mutex as WriteGate;

use crate::controller::{AppStateController, Mutation, MutationOutcome, NameAssignment};
use crate::error::{PartyError, Result};
use crate::models::{AppConfig, AppState};
use crate::store::StateBackend;

/// Shared, cloneable async handle to one [`AppStateController`].
///
/// A second mutation of a key that is still being written fails with
/// [`PartyError::MutationPending`] instead of racing the first.
pub struct AsyncPartyController<B> {
    inner: Arc<Mutex<AppStateController<B>>>,
    write_gate: Arc<WriteGate<()>>,
}

impl<B> Clone for AsyncPartyController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            write_gate: self.write_gate.clone(),
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> PartyError {
    PartyError::InvalidArgument(format!("Task join error: {e}"))
}

impl<B> AsyncPartyController<B>
where
    B: StateBackend + Clone + Send + 'static,
{
    pub fn new(controller: AppStateController<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
            write_gate: Arc::new(WriteGate::new(())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AppStateController<B>>> {
        self.inner
            .lock()
            .map_err(|_| PartyError::InvalidArgument("controller lock poisoned".into()))
    }

    /// A copy of the current local document, optimistic changes included.
    pub fn snapshot(&self) -> Result<AppState> {
        Ok(self.lock()?.state().clone())
    }

    pub fn has_voted(&self, user_id: &str, cocktail_id: &str) -> Result<bool> {
        Ok(self.lock()?.has_voted(user_id, cocktail_id))
    }

    pub fn vote_count(&self, cocktail_id: &str) -> Result<usize> {
        Ok(self.lock()?.vote_count(cocktail_id))
    }

    /// Run a mutation: apply it locally now, write it on the blocking pool,
    /// then commit or roll back.
    ///
    /// The local change is visible as soon as this is called; the remote write
    /// waits for any earlier write from this handle to settle first.
    pub async fn apply(&self, mutation: Mutation) -> Result<MutationOutcome> {
        let (pending, store) = {
            let mut controller = self.lock()?;
            match controller.begin(mutation)? {
                None => return Ok(MutationOutcome::LocalOnly),
                Some(pending) => (pending, controller.store().clone()),
            }
        };

        let _writing = self.write_gate.lock().await;
        let (pending, result) = tokio::task::spawn_blocking(move || {
            let result = pending.persist(&store);
            (pending, result)
        })
        .await
        .map_err(join_error)?;

        self.lock()?.settle(pending, result)
    }

    pub async fn toggle_vote(&self, user_id: &str, cocktail_id: &str) -> Result<MutationOutcome> {
        self.apply(Mutation::ToggleVote {
            user_id: user_id.to_string(),
            cocktail_id: cocktail_id.to_string(),
        })
        .await
    }

    pub async fn set_shortlist(&self, ids: Vec<String>) -> Result<MutationOutcome> {
        self.apply(Mutation::SetShortlist(ids)).await
    }

    pub async fn set_tags(&self, cocktail_id: &str, tags: Vec<String>) -> Result<MutationOutcome> {
        self.apply(Mutation::SetTags {
            cocktail_id: cocktail_id.to_string(),
            tags,
        })
        .await
    }

    pub async fn set_config(&self, config: AppConfig) -> Result<MutationOutcome> {
        self.apply(Mutation::SetConfig(config)).await
    }

    pub async fn set_user_name(&self, user_id: &str, name: &str) -> Result<NameAssignment> {
        let outcome = self
            .apply(Mutation::SetUserName {
                user_id: user_id.to_string(),
                name: name.to_string(),
            })
            .await?;
        let name = self
            .lock()?
            .state()
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        Ok(NameAssignment { name, outcome })
    }

    /// Reload the shared document.
    ///
    /// Returns `Ok(false)` when the controller is local-only or when
    /// [`cancel_fetches`](Self::cancel_fetches) (or a newer refresh) ran while
    /// this one was in flight; its result is then dropped.
    pub async fn refresh(&self) -> Result<bool> {
        let (ticket, store) = {
            let mut controller = self.lock()?;
            if controller.is_local_only() {
                return Ok(false);
            }
            (controller.begin_fetch(), controller.store().clone())
        };

        let result = tokio::task::spawn_blocking(move || store.fetch())
            .await
            .map_err(join_error)?;

        self.lock()?.complete_fetch(ticket, result)
    }

    /// Drop the results of refreshes still in flight.
    pub fn cancel_fetches(&self) -> Result<()> {
        self.lock()?.cancel_fetches();
        Ok(())
    }

    /// Run a blocking closure against the controller on the blocking pool.
    ///
    /// The closure may write through the controller's blocking helpers, so it
    /// waits its turn behind writes already in flight.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut AppStateController<B>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _writing = self.write_gate.lock().await;
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|_| PartyError::InvalidArgument("controller lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(join_error)?
    }
}
