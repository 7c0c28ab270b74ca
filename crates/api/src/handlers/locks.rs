//! Handlers for resource locks.
//!
//! Lock ids are capability-like: only the holder's session learns one, so
//! refresh and release take the id alone and do not re-check the holder.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::locking::{validate_resource_id, Lock, LockPolicy, LockStatus, ResourceType};
use folio_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::validate_body;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct AcquireLockRequest {
    pub resource_type: String,
    #[validate(range(min = 1, message = "resource_id must be positive"))]
    pub resource_id: DbId,
}

/// A lock with its computed expiry.
#[derive(Debug, Serialize)]
pub struct LockView {
    #[serde(flatten)]
    pub lock: Lock,
    pub expires_at: Timestamp,
    /// How often the holder should refresh.
    pub refresh_interval_secs: i64,
}

impl LockView {
    fn new(lock: Lock, policy: LockPolicy) -> Self {
        Self {
            expires_at: lock.expires_at(policy.ttl),
            refresh_interval_secs: policy.refresh_interval.num_seconds(),
            lock,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LockStatusView {
    pub status: LockStatus,
    pub holder_user_id: Option<DbId>,
    pub expires_at: Option<Timestamp>,
}

fn parse_resource(resource_type: &str, resource_id: DbId) -> AppResult<ResourceType> {
    let resource_type = resource_type.parse::<ResourceType>()?;
    validate_resource_id(resource_id).map_err(AppError::BadRequest)?;
    Ok(resource_type)
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{project_id}/locks
///
/// Acquire a lock for the caller. Returns 409 `LOCK_HELD` if another user
/// holds an active lock on the resource.
pub async fn acquire_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AcquireLockRequest>,
) -> AppResult<Json<DataResponse<LockView>>> {
    validate_body(&input)?;
    let resource_type = parse_resource(&input.resource_type, input.resource_id)?;

    let lock = state
        .locks
        .acquire_lock(project_id, resource_type, input.resource_id, auth.user_id)
        .await?;

    Ok(Json(DataResponse {
        data: LockView::new(lock, state.locks.policy()),
    }))
}

/// GET /api/v1/projects/{project_id}/locks
///
/// Active locks in a project. Expired rows are omitted.
pub async fn list_project_locks(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<LockView>>>> {
    let policy = state.locks.policy();
    let locks = state.locks.get_locks_for_project(project_id).await?;
    let data = locks
        .into_iter()
        .map(|lock| LockView::new(lock, policy))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/locks/{lock_id}/refresh
pub async fn refresh_lock(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(lock_id): Path<DbId>,
) -> AppResult<Json<DataResponse<LockView>>> {
    let lock = state.locks.refresh_lock(lock_id).await?;
    Ok(Json(DataResponse {
        data: LockView::new(lock, state.locks.policy()),
    }))
}

/// DELETE /api/v1/locks/{lock_id}
pub async fn release_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(lock_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.locks.release_lock(lock_id).await?;
    tracing::info!(lock_id, user_id = auth.user_id, "Lock release requested");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resources/{resource_type}/{resource_id}/lock
///
/// The active lock on a resource, or `null`.
pub async fn get_resource_lock(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path((resource_type, resource_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Option<LockView>>>> {
    let resource_type = parse_resource(&resource_type, resource_id)?;
    let policy = state.locks.policy();
    let lock = state
        .locks
        .get_lock_for_resource(resource_type, resource_id)
        .await?;
    Ok(Json(DataResponse {
        data: lock.map(|l| LockView::new(l, policy)),
    }))
}

/// GET /api/v1/resources/{resource_type}/{resource_id}/lock-status
///
/// `available`, `acquired` or `blocked` from the caller's point of view.
pub async fn get_lock_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((resource_type, resource_id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<LockStatusView>>> {
    let resource_type = parse_resource(&resource_type, resource_id)?;
    let ttl = state.locks.policy().ttl;
    let (status, lock) = state
        .locks
        .lock_status(resource_type, resource_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse {
        data: LockStatusView {
            status,
            holder_user_id: lock.as_ref().map(|l| l.user_id),
            expires_at: lock.as_ref().map(|l| l.expires_at(ttl)),
        },
    }))
}
