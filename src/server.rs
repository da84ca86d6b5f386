//! Query endpoints
//!
//! - `GET /`    — liveness, answers `Hello Rain`.
//! - `GET /now` — the next slots of the stored forecast as a JSON object
//!   `{"HH:MM": level}` in time order, `null` where the forecast has no
//!   value. `?count=N` selects how many slots (default 4, at most one day).

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::logging::{self, Component};
use crate::model::{GridSlot, SLOTS_PER_DAY};
use crate::store::{ForecastStore, SlotReading, DEFAULT_QUERY_COUNT};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ForecastStore>,
    /// Source of the current slot; the wall clock outside of tests.
    pub clock: fn() -> GridSlot,
}

impl AppState {
    pub fn new(store: Arc<ForecastStore>) -> Self {
        Self {
            store,
            clock: GridSlot::now_local,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NowParams {
    pub count: Option<usize>,
}

/// Query result serialized as an ordered `"HH:MM" -> level` map.
#[derive(Debug)]
pub struct NowcastView(pub Vec<SlotReading>);

impl Serialize for NowcastView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for reading in &self.0 {
            map.serialize_entry(&reading.slot.to_string(), &reading.intensity.map(|i| i.level()))?;
        }
        map.end()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/now", get(now))
        .with_state(state)
}

async fn hello() -> &'static str {
    "Hello Rain"
}

async fn now(State(state): State<AppState>, Query(params): Query<NowParams>) -> Json<NowcastView> {
    let count = params
        .count
        .unwrap_or(DEFAULT_QUERY_COUNT)
        .clamp(1, SLOTS_PER_DAY);
    Json(NowcastView(state.store.query((state.clock)(), count)))
}

/// Serves the query endpoints until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logging::info(Component::Http, None, &format!("listening on {}", addr));
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
