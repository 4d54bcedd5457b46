//! HTTP front end for the feed.
//!
//! - `GET /healthz`
//! - `POST /messages` with `{"message": "..."}`
//! - `GET /messages?count=N`, where `count` defaults to 10

use std::future::Future;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    access_point::AccessPoint, error::FeedError, message::ErrorKind, protocol::DEFAULT_GET_COUNT,
};

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesResponse {
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

pub fn router(feed: AccessPoint) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/messages", get(get_messages).post(post_message))
        .layer(TraceLayer::new_for_http())
        .with_state(feed)
}

pub async fn serve<F>(listener: TcpListener, feed: AccessPoint, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("http listening on {}", listener.local_addr()?);
    axum::serve(listener, router(feed))
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed")
}

async fn healthz() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn post_message(
    State(feed): State<AccessPoint>,
    Json(payload): Json<PostRequest>,
) -> Response {
    match feed.post(payload.message).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_messages(
    State(feed): State<AccessPoint>,
    Query(params): Query<GetParams>,
) -> Response {
    let count = params.count.unwrap_or(DEFAULT_GET_COUNT);
    match feed.get(count).await {
        Ok(messages) => Json(MessagesResponse { messages }).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: FeedError) -> Response {
    let (status, kind) = match err {
        FeedError::InvalidArgument { .. } => {
            (StatusCode::BAD_REQUEST, ErrorKind::InvalidArgument)
        }
        FeedError::Closed => (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::Closed),
    };
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind,
            message: err.to_string(),
        },
    };
    (status, Json(body)).into_response()
}
