//! HTTP API of the drip editor.
//!
//! A drag-and-drop front end drives the editor through these endpoints. All
//! edits are local until `POST /api/save`.
//!
//! # Endpoints
//!
//! - `GET /api/settings` - Course id and editing policy
//! - `GET /api/inventory` - Sections and lessons of the course
//! - `GET /api/chains` - Current chains
//! - `POST /api/chains` - Add an empty chain
//! - `DELETE /api/chains/:chain_id` - Remove a chain
//! - `DELETE /api/chains/:chain_id/lessons/:lesson_id` - Remove a lesson from a chain
//! - `POST /api/drag` - Apply a completed drag
//! - `POST /api/save` - Persist the chains to the backend
//! - `POST /api/reload` - Replace the chains with the backend's copy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use drip_core::{create_router, AppState, Config, CourseBackend, Inventory};
//!
//! # async fn example(backend: Arc<dyn CourseBackend>) {
//! let state = AppState::new(Config::default(), "42", Inventory::default(), backend);
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::backend::CourseBackend;
use crate::config::{Config, MembershipPolicy};
use crate::coordinator::DragResult;
use crate::editor::DripEditor;
use crate::error::DripError;
use crate::inventory::Inventory;
use crate::model::DripChain;
use crate::persistence::DripPersistence;
use crate::store::EditOutcome;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response body for the settings endpoint.
///
/// Lets a front end mirror the membership rule before it sends a drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    /// Course being edited.
    pub course_id: String,
    /// Whether a lesson may sit in several chains.
    pub membership: MembershipPolicy,
    /// Title prefix given to saved lessons the course no longer lists.
    pub placeholder_title_prefix: String,
}

/// Response body listing the current chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainsResponse {
    /// Chains in display order.
    pub chains: Vec<DripChain>,
    /// Lessons present in more than one chain.
    #[serde(default)]
    pub shared_lessons: Vec<String>,
}

/// Response body for edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    /// Whether the edit applied.
    pub outcome: EditOutcome,
    /// Chains after the edit.
    pub chains: Vec<DripChain>,
}

/// Response body for the save endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Number of edges sent to the backend.
    pub edges: usize,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared state for the API handlers.
#[derive(Debug)]
pub struct AppState {
    /// Editor configuration.
    pub config: Config,
    /// Course being edited.
    pub course_id: String,
    /// Inventory and chains; held only while reading or mutating.
    pub editor: Arc<Mutex<DripEditor>>,
    /// Backend adapter for loads and saves.
    pub persistence: Arc<DripPersistence>,
}

impl AppState {
    /// Creates state for editing `course_id` with no chains loaded yet.
    #[must_use]
    pub fn new(
        config: Config,
        course_id: impl Into<String>,
        inventory: Inventory,
        backend: Arc<dyn CourseBackend>,
    ) -> Self {
        let editor = DripEditor::new(inventory, config.membership);
        let persistence = DripPersistence::new(backend, config.placeholder_title_prefix.clone());
        Self {
            config,
            course_id: course_id.into(),
            editor: Arc::new(Mutex::new(editor)),
            persistence: Arc::new(persistence),
        }
    }

    /// Replaces the editor's chains with the backend's saved copy.
    ///
    /// Returns the number of chains loaded.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the current chains are kept in that case.
    pub async fn reload(&self) -> crate::Result<usize> {
        let inventory = self.editor.lock().await.inventory().clone();
        let lists = self.persistence.load(&self.course_id, &inventory).await?;
        let mut editor = self.editor.lock().await;
        editor.store_mut().replace_chains(lists);
        Ok(editor.chains().len())
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
struct ApiError(DripError);

impl From<DripError> for ApiError {
    fn from(err: DripError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DripError::ChainNotFound { .. } | DripError::SectionNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            DripError::InvalidLessonId { .. } => StatusCode::BAD_REQUEST,
            DripError::SaveInProgress { .. } => StatusCode::CONFLICT,
            DripError::Backend { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries permissive CORS for local front ends and a tracing
/// layer for request logging.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/settings", get(handle_settings))
        .route("/inventory", get(handle_inventory))
        .route("/chains", get(handle_list_chains).post(handle_add_chain))
        .route("/chains/:chain_id", delete(handle_remove_chain))
        .route(
            "/chains/:chain_id/lessons/:lesson_id",
            delete(handle_remove_lesson),
        )
        .route("/drag", post(handle_drag))
        .route("/save", post(handle_save))
        .route("/reload", post(handle_reload));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/settings`.
async fn handle_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        course_id: state.course_id.clone(),
        membership: state.config.membership,
        placeholder_title_prefix: state.config.placeholder_title_prefix.clone(),
    })
}

/// Handler for `GET /api/inventory`.
async fn handle_inventory(State(state): State<Arc<AppState>>) -> Json<Inventory> {
    let editor = state.editor.lock().await;
    Json(editor.inventory().clone())
}

/// Handler for `GET /api/chains`.
async fn handle_list_chains(State(state): State<Arc<AppState>>) -> Json<ChainsResponse> {
    let editor = state.editor.lock().await;
    Json(ChainsResponse {
        chains: editor.chains().to_vec(),
        shared_lessons: editor.store().shared_lessons(),
    })
}

/// Handler for `POST /api/chains`.
async fn handle_add_chain(State(state): State<Arc<AppState>>) -> (StatusCode, Json<DripChain>) {
    let mut editor = state.editor.lock().await;
    let chain = editor.store_mut().add_chain().clone();
    info!(chain_id = %chain.id, "Chain added");
    (StatusCode::CREATED, Json(chain))
}

/// Handler for `DELETE /api/chains/:chain_id`.
async fn handle_remove_chain(
    State(state): State<Arc<AppState>>,
    Path(chain_id): Path<String>,
) -> Result<Json<DripChain>, ApiError> {
    let mut editor = state.editor.lock().await;
    let removed = editor.store_mut().remove_chain(&chain_id)?;
    info!(chain_id = %removed.id, lessons = removed.len(), "Chain removed");
    Ok(Json(removed))
}

/// Handler for `DELETE /api/chains/:chain_id/lessons/:lesson_id`.
async fn handle_remove_lesson(
    State(state): State<Arc<AppState>>,
    Path((chain_id, lesson_id)): Path<(String, String)>,
) -> Result<Json<EditResponse>, ApiError> {
    let mut editor = state.editor.lock().await;
    let outcome = editor
        .store_mut()
        .remove_lesson_from_chain(&chain_id, &lesson_id)?;
    Ok(Json(EditResponse {
        outcome,
        chains: editor.chains().to_vec(),
    }))
}

/// Handler for `POST /api/drag`.
///
/// Ignored drops are not errors; the response says why nothing changed.
async fn handle_drag(
    State(state): State<Arc<AppState>>,
    Json(drag): Json<DragResult>,
) -> Result<Json<EditResponse>, ApiError> {
    let mut editor = state.editor.lock().await;
    let outcome = editor.apply_drag(&drag)?;
    if let EditOutcome::Ignored(reason) = outcome {
        warn!(
            source = %drag.source.droppable_id,
            %reason,
            "Drop ignored"
        );
    }
    Ok(Json(EditResponse {
        outcome,
        chains: editor.chains().to_vec(),
    }))
}

/// Handler for `POST /api/save`.
///
/// The chains are copied and the editor released before the backend call,
/// so edits continue while a save is in flight.
async fn handle_save(State(state): State<Arc<AppState>>) -> Result<Json<SaveResponse>, ApiError> {
    let chains = state.editor.lock().await.chains().to_vec();
    let edges = state.persistence.save(&state.course_id, &chains).await?;
    Ok(Json(SaveResponse { edges }))
}

/// Handler for `POST /api/reload`.
async fn handle_reload(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChainsResponse>, ApiError> {
    state.reload().await?;
    let editor = state.editor.lock().await;
    Ok(Json(ChainsResponse {
        chains: editor.chains().to_vec(),
        shared_lessons: editor.store().shared_lessons(),
    }))
}

// ============================================================================
// Tests
// ============================================================================
