// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Local storage node.
//!
//! Serves a `FeedStore` over HTTP for development and integration tests. Slot
//! writes must carry a valid topic-key signature; when a token is configured
//! they must also present it as a bearer token. Reads are open.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::TypedHeader;
use graffiti_kernel::identity::{SlotWrite, StreamId};
use graffiti_kernel::index::{decode_index, encode_header};
use graffiti_kernel::types::id::Address;
use graffiti_kernel::SeqIndex;
use headers::authorization::Bearer;
use headers::Authorization;
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::errors::{EngineError, EngineResult};
use crate::network::client::FEED_INDEX_HEADER;
use crate::store::{Entry, Receipt, SharedStore};
use crate::telemetry::render_metrics;

#[derive(Clone)]
pub struct NodeState {
    store: SharedStore,
    auth_token: Option<Arc<str>>,
}

impl NodeState {
    fn authorize(&self, bearer: Option<TypedHeader<Authorization<Bearer>>>) -> EngineResult<()> {
        let Some(expected) = &self.auth_token else {
            return Ok(());
        };
        match bearer {
            Some(TypedHeader(auth)) if auth.token() == expected.as_ref() => Ok(()),
            _ => Err(EngineError::Unauthorized),
        }
    }
}

pub fn build_router(store: SharedStore, auth_token: Option<String>) -> Router {
    if auth_token.is_some() {
        tracing::info!("Auth Enabled: Bearer token required for writes");
    } else {
        tracing::warn!("Auth Disabled: No token configured");
    }
    let state = NodeState {
        store,
        auth_token: auth_token.map(Arc::from),
    };

    Router::new()
        .route("/v1/feeds/:owner/:name/tip", get(read_tip))
        .route("/v1/feeds/:owner/:name/entries", get(read_range).post(write_entry))
        .route("/v1/feeds/:owner/:name/entries/:index", get(read_entry))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn stream_from_path(owner: String, name: String) -> StreamId {
    StreamId {
        owner: Address(format!("0x{}", owner.trim_start_matches("0x").to_lowercase())),
        name,
    }
}

fn slot_response(entry: Option<Entry>) -> Response {
    match entry {
        Some(entry) => (
            StatusCode::OK,
            [(FEED_INDEX_HEADER, encode_header(SeqIndex::new(entry.index)))],
            entry.payload,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn read_tip(
    State(state): State<NodeState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Response, EngineError> {
    let stream = stream_from_path(owner, name);
    Ok(slot_response(state.store.read_tip(&stream).await?))
}

async fn read_entry(
    State(state): State<NodeState>,
    Path((owner, name, index)): Path<(String, String, String)>,
) -> Result<Response, EngineError> {
    let stream = stream_from_path(owner, name);
    let Some(index) = decode_index(&index)?.get() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    Ok(slot_response(state.store.read_entry(&stream, index).await?))
}

#[derive(Deserialize)]
struct RangeParams {
    from: u64,
    to: u64,
}

async fn read_range(
    State(state): State<NodeState>,
    Path((owner, name)): Path<(String, String)>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<Entry>>, EngineError> {
    if params.from > params.to {
        return Err(EngineError::InvalidInput(format!(
            "empty range {}..={}",
            params.from, params.to
        )));
    }
    let stream = stream_from_path(owner, name);
    let entries = state.store.read_range(&stream, params.from, params.to).await?;
    Ok(Json(entries))
}

async fn write_entry(
    State(state): State<NodeState>,
    Path((owner, name)): Path<(String, String)>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(write): Json<SlotWrite>,
) -> Result<Json<Receipt>, EngineError> {
    state.authorize(bearer)?;
    if write.stream != stream_from_path(owner, name) {
        return Err(EngineError::InvalidInput("stream in body does not match path".into()));
    }
    let receipt = state.store.write_entry(&write).await?;
    tracing::debug!("Stored slot {} on {}", receipt.index, receipt.stream);
    Ok(Json(receipt))
}

async fn metrics_handler() -> impl IntoResponse {
    render_metrics()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
