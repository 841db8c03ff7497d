use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mirror_core::{CounterSnapshot, InteractionCounter, Responder, Timestamp};
use mirror_store::InteractionLog;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Mirror</title>
<style>
body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; }
textarea, input { width: 100%; box-sizing: border-box; margin-bottom: .5rem; }
#reply { white-space: pre-wrap; margin-top: 1rem; }
</style>
</head>
<body>
<h1>Mirror</h1>
<form id="ask">
<input id="name" placeholder="Your name (optional)">
<textarea id="query" rows="4" placeholder="What is on your mind?"></textarea>
<button type="submit">Reflect</button>
</form>
<div id="reply"></div>
<script>
document.getElementById("ask").addEventListener("submit", async (e) => {
  e.preventDefault();
  const body = { query: document.getElementById("query").value };
  const name = document.getElementById("name").value.trim();
  if (name) body.name = name;
  const res = await fetch("/api/consciousness", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  const data = await res.json();
  document.getElementById("reply").textContent = data.message || data.error;
});
</script>
</body>
</html>
"#;

const UNAVAILABLE: &str = "service temporarily unavailable";

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Shared handler state. The responder and counter are read-only or atomic;
/// the log and the random generator sit behind one async mutex.
#[derive(Clone)]
pub struct AppState {
    responder: Arc<Responder>,
    counter: Arc<InteractionCounter>,
    inner: Arc<Mutex<ServerState>>,
}

struct ServerState {
    log: InteractionLog,
    rng: SmallRng,
}

impl AppState {
    pub fn new(responder: Responder, log: InteractionLog, rng: SmallRng) -> Self {
        let counter = InteractionCounter::new(responder.table());
        Self {
            responder: Arc::new(responder),
            counter: Arc::new(counter),
            inner: Arc::new(Mutex::new(ServerState { log, rng })),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("request failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsciousnessRequest {
    pub query: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub counters: CounterSnapshot,
    pub logged: u64,
    pub categories: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/consciousness", post(consciousness))
        .route("/api/stats", get(stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM.
pub async fn run(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    tracing::info!("listening on http://{local}");
    println!("listening on http://{local}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

async fn consciousness(
    State(state): State<AppState>,
    payload: Result<Json<ConsciousnessRequest>, JsonRejection>,
) -> AppResult<Json<mirror_core::Response>> {
    let Json(req) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;

    let mut inner = state.inner.lock().await;
    let ServerState { log, rng } = &mut *inner;

    let classification = state.responder.classify(&req.query);
    let response = state.responder.reply(
        &classification,
        &req.query,
        req.name.as_deref(),
        Timestamp::now(),
        rng,
    );
    state.counter.record(classification.index);
    tracing::debug!(
        category = %response.category,
        score = response.score,
        "classified request"
    );

    if let Err(e) = log.append(&req.query, &response) {
        tracing::error!("failed to log interaction: {e}");
    }

    Ok(Json(response))
}

async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let logged = {
        let inner = state.inner.lock().await;
        inner
            .log
            .count()
            .map_err(|e| AppError::internal(format!("log count failed: {e}")))?
    };

    Ok(Json(StatsResponse {
        counters: state.counter.snapshot(),
        logged,
        categories: state.responder.table().len(),
    }))
}
