//! Route definitions for resource locks.
//!
//! All endpoints require the caller identity via the `AuthUser` extractor.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::locks;
use crate::state::AppState;

/// Lock routes, merged at the `/api/v1` root.
///
/// ```text
/// POST   /projects/{project_id}/locks                          -> acquire_lock
/// GET    /projects/{project_id}/locks                          -> list_project_locks
/// POST   /locks/{lock_id}/refresh                              -> refresh_lock
/// DELETE /locks/{lock_id}                                      -> release_lock
/// GET    /resources/{resource_type}/{resource_id}/lock         -> get_resource_lock
/// GET    /resources/{resource_type}/{resource_id}/lock-status  -> get_lock_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/locks",
            post(locks::acquire_lock).get(locks::list_project_locks),
        )
        .route("/locks/{lock_id}/refresh", post(locks::refresh_lock))
        .route("/locks/{lock_id}", delete(locks::release_lock))
        .route(
            "/resources/{resource_type}/{resource_id}/lock",
            get(locks::get_resource_lock),
        )
        .route(
            "/resources/{resource_type}/{resource_id}/lock-status",
            get(locks::get_lock_status),
        )
}
