//! Shared fixtures for the cocktail-party integration tests.
//!
//! Provides a handful of sample cocktails, a [`FlakyBackend`] that wraps
//! the in-memory backend and fails on demand, and a local JSONBin server in
//! [`fake_jsonbin`].

#![allow(dead_code)]

pub mod fake_jsonbin;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cocktail_party::{
    AppState, AppStateController, Cocktail, Ingredient, MemoryBackend, PartyError,
    RemoteStateStore, Result, RetryPolicy, StateBackend,
};

// ---------------------------------------------------------------------------
// Sample cocktails
// ---------------------------------------------------------------------------

pub fn cocktail(id: &str, name: &str, ingredients: &[(&str, Option<&str>)]) -> Cocktail {
    Cocktail {
        id: id.to_string(),
        name: name.to_string(),
        thumbnail: format!("https://example.test/{id}.jpg"),
        alcoholic: true,
        category: "Cocktail".to_string(),
        glass: "Cocktail glass".to_string(),
        instructions: String::new(),
        ingredients: ingredients
            .iter()
            .map(|(n, m)| Ingredient::new(*n, *m))
            .collect(),
        tags: Vec::new(),
    }
}

pub fn margarita() -> Cocktail {
    cocktail(
        "11007",
        "Margarita",
        &[
            ("Tequila", Some("1 1/2 oz")),
            ("Triple sec", Some("1/2 oz")),
            ("Lime juice", Some("1 oz")),
            ("Salt", None),
        ],
    )
}

pub fn daiquiri() -> Cocktail {
    cocktail(
        "11006",
        "Daiquiri",
        &[
            ("Light rum", Some("1 1/2 oz")),
            ("Lime", Some("Juice of 1/2")),
            ("Powdered sugar", Some("1 tsp")),
        ],
    )
}

pub fn mojito() -> Cocktail {
    cocktail(
        "11000",
        "Mojito",
        &[
            ("Light rum", Some("2-3 oz")),
            ("Lime", Some("Juice of 1")),
            ("Sugar", Some("2 tsp")),
            ("Mint", Some("2-4")),
            ("Soda water", None),
        ],
    )
}

pub fn tommys_margarita() -> Cocktail {
    cocktail(
        "17216",
        "Tommy's Margarita",
        &[
            ("Tequila", Some("1 1/2 oz")),
            ("Lime juice", Some("1 oz")),
            ("Agave syrup", Some("2 spoons")),
        ],
    )
}

pub fn screwdriver() -> Cocktail {
    cocktail(
        "11963",
        "Screwdriver",
        &[("Vodka", Some("2 oz")), ("Orange juice", None)],
    )
}

pub fn empty_glass() -> Cocktail {
    cocktail("99999", "Empty glass", &[])
}

pub fn sample_cocktails() -> Vec<Cocktail> {
    vec![margarita(), daiquiri(), mojito(), tommys_margarita(), screwdriver()]
}

// ---------------------------------------------------------------------------
// FlakyBackend
// ---------------------------------------------------------------------------

/// What a scripted failure looks like.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transient,
    Unauthorized,
    BadRequest,
}

impl Failure {
    fn into_error(self) -> PartyError {
        match self {
            Failure::Transient => PartyError::Status {
                status: 503,
                message: "Service Unavailable".into(),
            },
            Failure::Unauthorized => PartyError::Unauthorized("bad key".into()),
            Failure::BadRequest => PartyError::BadRequest("Invalid data format".into()),
        }
    }
}

/// An in-memory backend whose writes fail according to a script.
#[derive(Debug, Clone, Default)]
pub struct FlakyBackend {
    pub inner: MemoryBackend,
    put_failures: Arc<Mutex<VecDeque<Failure>>>,
    fail_every_put: Arc<Mutex<Option<Failure>>>,
    pub puts: Arc<AtomicUsize>,
    pub gets: Arc<AtomicUsize>,
}

impl FlakyBackend {
    pub fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next writes, one scripted failure each.
    pub fn fail_next_puts(&self, failures: &[Failure]) {
        self.put_failures.lock().unwrap().extend(failures.iter().copied());
    }

    /// Fail every write until cleared with `None`.
    pub fn fail_every_put(&self, failure: Option<Failure>) {
        *self.fail_every_put.lock().unwrap() = failure;
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl StateBackend for FlakyBackend {
    fn get(&self) -> Result<Option<AppState>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get()
    }

    fn put(&self, state: &AppState) -> Result<AppState> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = *self.fail_every_put.lock().unwrap() {
            return Err(failure.into_error());
        }
        if let Some(failure) = self.put_failures.lock().unwrap().pop_front() {
            return Err(failure.into_error());
        }
        self.inner.put(state)
    }
}

/// A backend that is never configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredBackend;

impl StateBackend for UnconfiguredBackend {
    fn is_configured(&self) -> bool {
        false
    }

    fn get(&self) -> Result<Option<AppState>> {
        panic!("unconfigured backend must never be read");
    }

    fn put(&self, _state: &AppState) -> Result<AppState> {
        panic!("unconfigured backend must never be written");
    }
}

// ---------------------------------------------------------------------------
// Controllers
// ---------------------------------------------------------------------------

pub fn no_delay() -> RetryPolicy {
    RetryPolicy::new(2, Duration::ZERO)
}

pub fn store<B: StateBackend>(backend: B) -> RemoteStateStore<B> {
    RemoteStateStore::new(backend).with_retry_policy(no_delay())
}

/// A connected controller over a flaky backend that shares `remote`.
pub fn flaky_controller(remote: &MemoryBackend) -> (AppStateController<FlakyBackend>, FlakyBackend) {
    let backend = FlakyBackend::new(remote.clone());
    let controller = AppStateController::new(store(backend.clone()));
    (controller, backend)
}

/// A connected controller with `user_id` already registered as `name`.
pub fn registered_controller(
    remote: &MemoryBackend,
    user_id: &str,
    name: &str,
) -> (AppStateController<FlakyBackend>, FlakyBackend) {
    let (mut controller, backend) = flaky_controller(remote);
    controller.set_user_name(user_id, name).unwrap();
    (controller, backend)
}
