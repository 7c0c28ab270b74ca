pub mod health;
pub mod locks;
pub mod versions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects/{project_id}/locks                         acquire, list
/// /locks/{lock_id}                                     release
/// /locks/{lock_id}/refresh                             refresh
/// /resources/{resource_type}/{resource_id}/lock        active lock
/// /resources/{resource_type}/{resource_id}/lock-status derived status
///
/// /projects/{project_id}/versions                      create, list
/// /versions/compare                                    diff two versions
/// /versions/{version_id}                               get
/// /versions/{version_id}/restore                       restore
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(locks::router())
        .merge(versions::router())
}
