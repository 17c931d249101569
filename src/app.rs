use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::certificate::Certificate;
use crate::config::Config;
use crate::curriculum::Catalog;
use crate::dashboard::CourseDashboard;
use crate::error::{ProgressError, SessionError, StoreError};
use crate::progression::{accessibility, completion_percent, current_entity};
use crate::record::CompletionRecord;
use crate::sequence::ScopeId;
use crate::session::{CompletionOutcome, ProgressSession, QuizOutcome};
use crate::store::{JsonFileStore, ProfileStore};

pub struct AppState {
    pub catalog: Catalog,
    pub store: Box<dyn ProfileStore>,
}

impl AppState {
    fn session(&self, user: String) -> ProgressSession<'_, dyn ProfileStore> {
        ProgressSession::new(user, &self.catalog, self.store.as_ref())
    }
}

#[derive(Serialize)]
struct CourseListing {
    id: String,
    title: String,
    levels: usize,
}

#[derive(Deserialize)]
struct ScopeQuery {
    scope: String,
}

#[derive(Serialize)]
struct ScopeProgress {
    scope: ScopeId,
    record: CompletionRecord,
    accessible: Vec<bool>,
    percent: u8,
    current: Option<String>,
}

#[derive(Deserialize)]
struct CompleteRequest {
    course: String,
    level: String,
    submodule: String,
}

#[derive(Deserialize)]
struct QuizSubmission {
    course: String,
    level: String,
    answers: Vec<Option<usize>>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

/// Maps library errors onto HTTP statuses.
pub struct ApiError(SessionError);

impl<E: Into<SessionError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SessionError::Locked(_) => StatusCode::FORBIDDEN,
            SessionError::Progress(ProgressError::CourseIncomplete { .. }) => StatusCode::FORBIDDEN,
            SessionError::Progress(
                ProgressError::UnknownCourse(_)
                | ProgressError::UnknownLevel { .. }
                | ProgressError::UnknownEntity(_)
                | ProgressError::NoQuiz { .. },
            ) => StatusCode::NOT_FOUND,
            SessionError::Progress(_) => StatusCode::BAD_REQUEST,
            SessionError::Store(StoreError::InvalidUser(_)) => StatusCode::BAD_REQUEST,
            SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(err = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                status: "error",
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/catalog", get(list_courses))
        .route("/api/:user/progress", get(get_progress))
        .route("/api/:user/complete", post(complete_submodule))
        .route("/api/:user/quiz", post(submit_quiz))
        .route("/api/:user/dashboard/:course", get(get_dashboard))
        .route("/api/:user/certificate/:course", get(get_certificate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load(&config.catalog_path)?;
    let store = JsonFileStore::open(&config.data_dir)?;

    let app_state = Arc::new(AppState {
        catalog,
        store: Box::new(store),
    });
    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, data_dir = %config.data_dir.display(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_courses(State(state): State<Arc<AppState>>) -> Json<Vec<CourseListing>> {
    Json(
        state
            .catalog
            .courses
            .iter()
            .map(|c| CourseListing {
                id: c.id.clone(),
                title: c.title.clone(),
                levels: c.levels.len(),
            })
            .collect(),
    )
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<ScopeProgress>, ApiError> {
    let scope: ScopeId = query.scope.parse()?;
    let sequence = state.catalog.sequence_for(&scope)?;
    let record = state.store.get_completion_record(&user, &scope)?;

    Ok(Json(ScopeProgress {
        accessible: accessibility(&sequence, &record),
        percent: completion_percent(&sequence, &record),
        current: current_entity(&sequence, &record).map(str::to_string),
        scope,
        record,
    }))
}

async fn complete_submodule(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompletionOutcome>, ApiError> {
    let mut session = state.session(user);
    let outcome = session.complete_submodule(&req.course, &req.level, &req.submodule)?;
    Ok(Json(outcome))
}

async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(req): Json<QuizSubmission>,
) -> Result<Json<QuizOutcome>, ApiError> {
    let mut session = state.session(user);
    let outcome = session.submit_quiz(&req.course, &req.level, &req.answers)?;
    Ok(Json(outcome))
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path((user, course)): Path<(String, String)>,
) -> Result<Json<CourseDashboard>, ApiError> {
    let mut session = state.session(user);
    Ok(Json(session.dashboard(&course)?))
}

async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Path((user, course)): Path<(String, String)>,
) -> Result<Json<Certificate>, ApiError> {
    let mut session = state.session(user);
    Ok(Json(session.certificate(&course)?))
}
