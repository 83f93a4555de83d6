//! Route handlers.
//!
//! Handlers only translate between JSON and [`KeyRegistry`] calls. Registry
//! calls hit SQLite, so they run on the blocking pool.

use crate::api::dto::{
    AuthenticateRequest, AuthenticateResponse, CreateKeyRequest, HealthResponse, KeyListResponse,
    KeyResponse, LoginRequest, SuccessResponse,
};
use crate::api::AppState;
use crate::policy::expiry::ExpiresIn;
use crate::registry::KeyRegistry;
use crate::KeywardenError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;

type ApiResult<T> = Result<Json<T>, KeywardenError>;

/// Run a registry call on the blocking pool.
async fn with_registry<T, F>(registry: &KeyRegistry, f: F) -> Result<T, KeywardenError>
where
    T: Send + 'static,
    F: FnOnce(&KeyRegistry) -> Result<T, KeywardenError> + Send + 'static,
{
    let registry = registry.clone();
    tokio::task::spawn_blocking(move || f(&registry))
        .await
        .map_err(|e| KeywardenError::Storage(format!("registry task failed: {e}")))?
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, KeywardenError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| KeywardenError::InvalidRequest(rejection.body_text()))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, KeywardenError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(KeywardenError::MissingField { field })
}

/// `POST /api/authenticate`
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> ApiResult<AuthenticateResponse> {
    let request = body(payload)?;
    let key = required(request.key, "key")?;
    let hwid = request.hwid;

    let outcome = with_registry(&state.registry, move |registry| {
        registry.authenticate(&key, hwid.as_deref())
    })
    .await?;

    Ok(Json(outcome.into()))
}

/// `POST /api/admin/login`
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let request = body(payload)?;
    state.admin.verify(request.password.as_deref())?;
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /api/admin/keys`
pub async fn list_keys(State(state): State<AppState>) -> ApiResult<KeyListResponse> {
    let keys = with_registry(&state.registry, |registry| registry.list()).await?;
    Ok(Json(KeyListResponse {
        success: true,
        keys,
    }))
}

/// `POST /api/admin/keys`
pub async fn create_key(
    State(state): State<AppState>,
    payload: Result<Json<CreateKeyRequest>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let request = body(payload)?;
    let key = required(request.key, "key")?;
    let expires_in = ExpiresIn::from_json(request.expires_in.as_ref());
    let description = request.description;

    with_registry(&state.registry, move |registry| {
        registry.create(&key, expires_in, description)
    })
    .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// `DELETE /api/admin/keys/{id}`
///
/// An id that is not a number matches no key, so it succeeds like any other
/// unknown id.
pub async fn delete_key(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<SuccessResponse> {
    let Ok(id) = raw_id.parse::<i64>() else {
        debug!(id = %raw_id, "delete with non-numeric id");
        return Ok(Json(SuccessResponse::ok()));
    };

    with_registry(&state.registry, move |registry| registry.delete(id)).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `POST /api/admin/keys/{id}/ban`
pub async fn ban_key(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<KeyResponse> {
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| KeywardenError::InvalidRequest(format!("invalid key id: {raw_id}")))?;

    let key = with_registry(&state.registry, move |registry| registry.ban(id)).await?;
    Ok(Json(KeyResponse { success: true, key }))
}

/// `GET /api/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
