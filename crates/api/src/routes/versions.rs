//! Route definitions for report versions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::versions;
use crate::state::AppState;

/// Version routes, merged at the `/api/v1` root.
///
/// ```text
/// POST /projects/{project_id}/versions   -> create_version
/// GET  /projects/{project_id}/versions   -> list_versions
/// GET  /versions/compare?a=&b=           -> compare_versions
/// GET  /versions/{version_id}            -> get_version
/// POST /versions/{version_id}/restore    -> restore_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/versions",
            post(versions::create_version).get(versions::list_versions),
        )
        .route("/versions/compare", get(versions::compare_versions))
        .route("/versions/{version_id}", get(versions::get_version))
        .route("/versions/{version_id}/restore", post(versions::restore_version))
}
