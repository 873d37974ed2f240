// HTTP routes for the brainrot game.
//
// The layer is thin: pull the username, action and optional target out of the
// request, hand them to the core service, and send the reply back as text.

use super::api_error::ApiError;
use crate::core::brainrot::{Action, BrainrotService, GameStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// ── Request types ─────────────────────────────────────────────────────

/// Body of `POST /brainrot`: `{ "username": "...", "args": [action, target?] }`.
#[derive(Debug, Deserialize)]
pub struct BrainrotRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

// ── Shared application state ─────────────────────────────────────────

pub struct AppState<S: GameStore> {
    pub brainrot: Arc<BrainrotService<S>>,
}

// Derive would demand S: Clone, which stores don't need to be.
impl<S: GameStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            brainrot: Arc::clone(&self.brainrot),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router<S: GameStore + 'static>(brainrot: Arc<BrainrotService<S>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/brainrot", post(brainrot_post::<S>))
        .route("/brainrot/{username}/{action}", get(brainrot_get::<S>))
        .route(
            "/brainrot/{username}/{action}/{target}",
            get(brainrot_get_with_target::<S>),
        )
        // Routes from the first version of the bot integration
        .route("/inventory/{username}", get(legacy_inventory::<S>))
        .route("/farm/{username}", get(legacy_farm::<S>))
        .route("/steal/{thief}/{victim}", get(legacy_steal::<S>))
        .with_state(AppState { brainrot })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "brainrot-api" }))
}

/// Validate the raw inputs and run the action.
async fn run<S: GameStore>(
    state: &AppState<S>,
    username: Option<&str>,
    action: Option<&str>,
    target: Option<&str>,
) -> Result<String, ApiError> {
    let username = username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Falta el nombre de usuario.".to_string()))?;
    let action = action
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Falta la acción.".to_string()))?;

    let reply = state
        .brainrot
        .execute(username, Action::parse(action, target))
        .await?;
    Ok(reply)
}

async fn brainrot_post<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<BrainrotRequest>, JsonRejection>,
) -> Result<String, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Cuerpo de la petición inválido: {}", rejection.body_text()))
    })?;

    let mut args = request.args.iter().map(String::as_str);
    let action = args.next();
    let target = args.next();
    run(&state, request.username.as_deref(), action, target).await
}

async fn brainrot_get<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    Path((username, action)): Path<(String, String)>,
) -> Result<String, ApiError> {
    run(&state, Some(&username), Some(&action), None).await
}

async fn brainrot_get_with_target<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    Path((username, action, target)): Path<(String, String, String)>,
) -> Result<String, ApiError> {
    run(&state, Some(&username), Some(&action), Some(&target)).await
}

async fn legacy_inventory<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> Result<String, ApiError> {
    run(&state, Some(&username), Some("inventario"), None).await
}

async fn legacy_farm<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    Path(username): Path<String>,
) -> Result<String, ApiError> {
    run(&state, Some(&username), Some("farmear"), None).await
}

async fn legacy_steal<S: GameStore + 'static>(
    State(state): State<AppState<S>>,
    Path((thief, victim)): Path<(String, String)>,
) -> Result<String, ApiError> {
    run(&state, Some(&thief), Some("robar"), Some(&victim)).await
}

// ============================================================================
// TESTS
// ============================================================================
