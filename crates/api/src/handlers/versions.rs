//! Handlers for report versions: snapshot, history, restore and compare.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::diff::{DiffEntry, DiffSummary};
use folio_core::snapshot::{ReportVersion, ReportVersionSummary};
use folio_core::types::DbId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::validate_body;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateVersionRequest {
    #[serde(default)]
    #[validate(length(max = 500, message = "summary must be at most 500 characters"))]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedVersion {
    pub id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    /// Older version.
    pub a: DbId,
    /// Newer version.
    pub b: DbId,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub entries: Vec<DiffEntry>,
    pub summary: DiffSummary,
}

/// POST /api/v1/projects/{project_id}/versions
///
/// Snapshot the project's current tree. The caller is recorded as author.
/// The body is optional; without one the version has no summary.
pub async fn create_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    body: Option<Json<CreateVersionRequest>>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedVersion>>)> {
    let input = body.map(|Json(req)| req).unwrap_or_default();
    validate_body(&input)?;

    let id = state
        .versions
        .create_version_snapshot(project_id, input.summary, Some(auth.user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedVersion { id },
        }),
    ))
}

/// GET /api/v1/projects/{project_id}/versions
pub async fn list_versions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ReportVersionSummary>>>> {
    let data = state.versions.list_versions(project_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/versions/{version_id}
pub async fn get_version(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReportVersion>>> {
    let data = state.versions.get_version(version_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/versions/{version_id}/restore
///
/// Replace the project's live tree with the snapshot. Section and block ids
/// change.
pub async fn restore_version(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.versions.restore_version(version_id).await?;
    tracing::info!(version_id, user_id = auth.user_id, "Restore requested");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/versions/compare?a={older}&b={newer}
pub async fn compare_versions(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> AppResult<Json<DataResponse<CompareResponse>>> {
    let entries = state.versions.compare_versions(params.a, params.b).await?;
    let summary = DiffSummary::from_entries(&entries);
    Ok(Json(DataResponse {
        data: CompareResponse { entries, summary },
    }))
}
