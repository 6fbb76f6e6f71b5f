//! In-process items service

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crudcheck_core::model::{ItemRow, NewItem};

use crate::error::TestError;
use crate::store::InMemoryItemStore;

#[derive(Debug, Deserialize)]
struct ItemPayload {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default)]
struct Faults {
    keep_rows_on_delete: AtomicBool,
    skip_rows_on_create: AtomicBool,
    /// Items acknowledged to clients but never written to the store
    unpersisted: RwLock<BTreeMap<i64, ItemRow>>,
}

#[derive(Clone)]
struct AppState {
    store: InMemoryItemStore,
    faults: Arc<Faults>,
}

/// Items service with the same contract as the service under test
#[derive(Clone)]
pub struct ItemsService {
    state: AppState,
}

impl ItemsService {
    pub fn new(store: InMemoryItemStore) -> Self {
        Self {
            state: AppState {
                store,
                faults: Arc::new(Faults::default()),
            },
        }
    }

    /// Answer `DELETE` with success but leave the row in the store
    pub fn keep_rows_on_delete(&self, enabled: bool) {
        self.state
            .faults
            .keep_rows_on_delete
            .store(enabled, Ordering::SeqCst);
    }

    /// Answer `POST` with a fresh id but never write the row. The service
    /// still serves the item over `GET` from its own memory.
    pub fn skip_rows_on_create(&self, enabled: bool) {
        self.state
            .faults
            .skip_rows_on_create
            .store(enabled, Ordering::SeqCst);
    }

    /// Item acknowledged under `name` without a row behind it
    pub fn unpersisted_item(&self, name: &str) -> Option<ItemRow> {
        self.state
            .faults
            .unpersisted
            .read()
            .values()
            .find(|row| row.name == name)
            .cloned()
    }

    pub fn store(&self) -> &InMemoryItemStore {
        &self.state.store
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/items", post(create_item))
            .route("/items/:id", get(get_item).delete(delete_item))
            .with_state(self.state.clone())
    }

    /// Serve on an ephemeral localhost port
    pub async fn start(&self) -> Result<RunningService, TestError> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Items service stopped: {}", e);
            }
        });

        debug!(%addr, "Items service listening");
        Ok(RunningService { addr, handle })
    }
}

/// A started service; stops when dropped
pub struct RunningService {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl RunningService {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for RunningService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": "Item not found" })),
    )
        .into_response()
}

fn item_json(row: &ItemRow) -> Response {
    Json(json!({
        "id": row.id,
        "name": row.name,
        "description": row.description,
    }))
    .into_response()
}

async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Response {
    let item = NewItem::new(payload.name, payload.description);
    if state.faults.skip_rows_on_create.load(Ordering::SeqCst) {
        let row = ItemRow {
            id: state.store.reserve_id(),
            name: item.name,
            description: item.description,
        };
        state.faults.unpersisted.write().insert(row.id, row.clone());
        return item_json(&row);
    }
    item_json(&state.store.insert(&item))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let row = state
        .store
        .get(id)
        .or_else(|| state.faults.unpersisted.read().get(&id).cloned());
    match row {
        Some(row) => item_json(&row),
        None => not_found(),
    }
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let found = if state.faults.keep_rows_on_delete.load(Ordering::SeqCst) {
        state.store.get(id).is_some()
    } else {
        state.store.remove(id).is_some()
    };
    let found = found || state.faults.unpersisted.write().remove(&id).is_some();

    if !found {
        return not_found();
    }
    Json(json!({ "message": format!("Item {} deleted", id) })).into_response()
}
