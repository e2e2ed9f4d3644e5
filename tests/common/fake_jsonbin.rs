//! A local stand-in for the JSONBin v3 API, served by axum on a background
//! thread so blocking clients can talk to it from plain `#[test]`s.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use cocktail_party::{JsonBinBackend, StoreConfig};
use serde_json::{json, Value};

pub const BIN_ID: &str = "party-bin";
pub const ACCESS_KEY: &str = "$2a$10$party-key";

#[derive(Debug, Default)]
struct Bin {
    /// `None` until the first write; `Some(Value::Null)` serves `"record": null`.
    record: Option<Value>,
    put_failures: VecDeque<(u16, String)>,
    access_keys: Vec<String>,
    puts: usize,
}

type SharedBin = Arc<Mutex<Bin>>;

/// One bin behind a real HTTP listener on 127.0.0.1.
#[derive(Clone)]
pub struct FakeJsonBin {
    base_url: String,
    bin: SharedBin,
}

impl FakeJsonBin {
    pub fn start() -> Self {
        let bin = SharedBin::default();
        let app = Router::new()
            .route("/b/{id}/latest", get(read))
            .route("/b/{id}", put(write))
            .with_state(bin.clone());

        let (tx, rx) = mpsc::channel::<SocketAddr>();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                tx.send(listener.local_addr().unwrap()).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });
        let addr = rx.recv().unwrap();

        Self {
            base_url: format!("http://{addr}"),
            bin,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A backend for this bin authenticating with `access_key`.
    pub fn backend(&self, access_key: &str) -> JsonBinBackend {
        JsonBinBackend::new(
            Some(StoreConfig::new(BIN_ID, access_key)),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(self.base_url.clone())
    }

    pub fn set_record(&self, record: Value) {
        self.bin.lock().unwrap().record = Some(record);
    }

    pub fn record(&self) -> Option<Value> {
        self.bin.lock().unwrap().record.clone()
    }

    /// Answer the next writes with these statuses and bodies instead of storing.
    pub fn fail_next_puts(&self, failures: &[(u16, &str)]) {
        self.bin
            .lock()
            .unwrap()
            .put_failures
            .extend(failures.iter().map(|(s, b)| (*s, b.to_string())));
    }

    /// The `X-Access-Key` of every request, in arrival order.
    pub fn access_keys(&self) -> Vec<String> {
        self.bin.lock().unwrap().access_keys.clone()
    }

    pub fn put_count(&self) -> usize {
        self.bin.lock().unwrap().puts
    }
}

fn access_key(headers: &HeaderMap) -> String {
    headers
        .get("x-access-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid X-Access-Key provided" })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Bin not found or it doesn't belong to your account" })),
    )
        .into_response()
}

async fn read(State(bin): State<SharedBin>, Path(id): Path<String>, headers: HeaderMap) -> Response {
    let key = access_key(&headers);
    let mut bin = bin.lock().unwrap();
    bin.access_keys.push(key.clone());
    if key != ACCESS_KEY {
        return unauthorized();
    }
    match &bin.record {
        Some(record) if id == BIN_ID => Json(json!({
            "record": record,
            "metadata": { "id": id, "private": true },
        }))
        .into_response(),
        _ => not_found(),
    }
}

async fn write(
    State(bin): State<SharedBin>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let key = access_key(&headers);
    let mut bin = bin.lock().unwrap();
    bin.puts += 1;
    bin.access_keys.push(key.clone());
    if let Some((status, text)) = bin.put_failures.pop_front() {
        return (StatusCode::from_u16(status).unwrap(), text).into_response();
    }
    if key != ACCESS_KEY {
        return unauthorized();
    }
    if id != BIN_ID {
        return not_found();
    }
    bin.record = Some(body.clone());
    Json(json!({
        "record": body,
        "metadata": { "parentId": id, "private": true },
    }))
    .into_response()
}
