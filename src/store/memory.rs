use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::models::AppState;
use crate::store::StateBackend;

/// An in-process stand-in for the hosted document.
///
/// Clones share the same document, so several stores (or several
/// controllers) can talk to one "remote".
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    doc: Arc<Mutex<Option<AppState>>>,
}

impl MemoryBackend {
    /// A backend whose document has never been written.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            doc: Arc::new(Mutex::new(Some(state))),
        }
    }

    /// A copy of the stored document, if one has been written.
    pub fn snapshot(&self) -> Option<AppState> {
        self.lock().clone()
    }

    /// Overwrite the stored document directly, bypassing any merge.
    pub fn replace(&self, state: AppState) {
        *self.lock() = Some(state);
    }

    fn lock(&self) -> MutexGuard<'_, Option<AppState>> {
        self.doc.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateBackend for MemoryBackend {
    fn get(&self) -> Result<Option<AppState>> {
        Ok(self.lock().clone())
    }

    fn put(&self, state: &AppState) -> Result<AppState> {
        *self.lock() = Some(state.clone());
        Ok(state.clone())
    }
}
