//! HTTP surface used by the CRUD layer.
//!
//! | Method | Path                         | Body                  |
//! |--------|------------------------------|-----------------------|
//! | GET    | /health                      |                       |
//! | GET    | /api/languages               |                       |
//! | GET    | /api/metrics                 |                       |
//! | POST   | /api/translations            | `CreateRequest`       |
//! | PUT    | /api/translations            | `UpdateRequest`       |
//! | POST   | /api/translations/languages  | `AddLanguagesRequest` |
//! | POST   | /api/resolve                 | stored row + `lang`   |
//!
//! Errors are returned as `{ "error": "..." }`.

use crate::i18n::MetricsReport;
use crate::localizer::{
    AddLanguagesOutcome, AddLanguagesRequest, CreateRequest, LocalizeError, Localizer,
    TranslationOutcome, UpdateRequest,
};
use crate::resolver::LocalizedView;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::warn;

type AppState = Arc<Localizer>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Localize(#[from] LocalizeError),

    #[error(transparent)]
    Payload(#[from] JsonRejection),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Localize(LocalizeError::UnsupportedLanguage(_)) => StatusCode::BAD_REQUEST,
            ApiError::Localize(LocalizeError::InvalidFields(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Payload(rejection) => rejection.status(),
        };

        warn!("Request rejected ({}): {}", status, self);
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LanguagesResponse {
    default_language: &'static str,
    languages: Vec<LanguageEntry>,
}

/// A stored row and the language the reader asked for.
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub record: Value,
    #[serde(default)]
    pub lang: String,
}

pub fn router(localizer: Arc<Localizer>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/languages", get(languages))
        .route("/api/metrics", get(metrics))
        .route("/api/translations", post(create).put(update))
        .route("/api/translations/languages", post(add_languages))
        .route("/api/resolve", post(resolve))
        .layer(TraceLayer::new_for_http())
        .with_state(localizer)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn languages(State(localizer): State<AppState>) -> Json<LanguagesResponse> {
    let registry = localizer.registry();
    let languages = registry
        .list_enabled()
        .iter()
        .map(|lang| LanguageEntry {
            code: lang.code,
            name: lang.name,
            native_name: lang.native_name,
        })
        .collect();

    Json(LanguagesResponse {
        default_language: registry.default_language().code,
        languages,
    })
}

async fn metrics(State(localizer): State<AppState>) -> Json<MetricsReport> {
    Json(localizer.metrics())
}

async fn create(
    State(localizer): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<Json<TranslationOutcome>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(localizer.create(request).await?))
}

async fn update(
    State(localizer): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<TranslationOutcome>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(localizer.update(request).await?))
}

async fn add_languages(
    State(localizer): State<AppState>,
    payload: Result<Json<AddLanguagesRequest>, JsonRejection>,
) -> Result<Json<AddLanguagesOutcome>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(localizer.add_languages(request).await))
}

async fn resolve(
    State(localizer): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<LocalizedView>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(localizer.resolve_stored(request.record, &request.lang)))
}
