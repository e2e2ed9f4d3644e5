//! Read-merge-write access to the shared party document.
//!
//! [`RemoteStateStore`] owns a [`StateBackend`] (the raw get/put transport)
//! and layers the document semantics on top: a missing remote document reads
//! as the default state, every write overlays a [`StatePatch`] on the latest
//! fetched snapshot, and [`update_with_retry`](RemoteStateStore::update_with_retry)
//! repeats the whole round trip on transient failures.

mod jsonbin;
mod memory;

pub use jsonbin::JsonBinBackend;
pub use memory::MemoryBackend;

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config;
use crate::error::{PartyError, Result};
use crate::models::{AppState, StatePatch};

// ---------------------------------------------------------------------------
// StateBackend
// ---------------------------------------------------------------------------

/// Raw transport for the party document.
pub trait StateBackend {
    /// Whether the backend has usable credentials. Unconfigured backends are
    /// never called.
    fn is_configured(&self) -> bool {
        true
    }

    /// Read the stored document. `Ok(None)` means the document does not exist yet.
    fn get(&self) -> Result<Option<AppState>>;

    /// Replace the stored document, returning the record the remote confirmed.
    fn put(&self, state: &AppState) -> Result<AppState>;
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one fails.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: config::DEFAULT_MAX_RETRIES,
            delay: config::DEFAULT_RETRY_DELAY,
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteStateStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RemoteStateStore<B> {
    backend: B,
    retry: RetryPolicy,
}

impl<B: StateBackend> RemoteStateStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn configured(&self) -> bool {
        self.backend.is_configured()
    }

    /// Fetch the latest document.
    ///
    /// A document that was never written reads as [`AppState::default()`];
    /// every other failure is returned.
    pub fn fetch(&self) -> Result<AppState> {
        if !self.configured() {
            return Err(PartyError::NotConfigured);
        }
        match self.backend.get()? {
            Some(state) => Ok(state),
            None => {
                debug!("party document not found, starting from the default state");
                Ok(AppState::default())
            }
        }
    }

    /// Fetch for display purposes only: failures are logged and read as the
    /// default document. Mutations must use [`fetch`](Self::fetch).
    pub fn fetch_or_default(&self) -> AppState {
        self.fetch().unwrap_or_else(|e| {
            warn!(error = %e, "failed to load party state, showing defaults");
            AppState::default()
        })
    }

    /// Overlay `patch` on the latest document and persist the result.
    ///
    /// Returns the document as confirmed by the remote.
    pub fn write(&self, patch: StatePatch) -> Result<AppState> {
        let latest = self.fetch()?;
        self.put_merged(patch, &latest)
    }

    /// Fetch the latest document, compute a patch from it, and write the merge,
    /// repeating the whole round trip on transient failures.
    ///
    /// `updater` runs once per attempt against that attempt's snapshot, so
    /// anything it derives from the document is always derived from fresh data.
    pub fn update_with_retry<F>(&self, mut updater: F) -> Result<AppState>
    where
        F: FnMut(&AppState) -> StatePatch,
    {
        let mut attempt = 0;
        loop {
            let result = self.fetch().and_then(|latest| {
                let patch = updater(&latest);
                self.put_merged(patch, &latest)
            });

            match result {
                Ok(state) => return Ok(state),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        error = %e,
                        "party state update failed, retrying"
                    );
                    if !self.retry.delay.is_zero() {
                        thread::sleep(self.retry.delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn put_merged(&self, patch: StatePatch, latest: &AppState) -> Result<AppState> {
        let merged = patch.merged_over(latest);
        self.backend.put(&merged)
    }
}
