//! Lock lifecycle: acquire, refresh, release, and expiry-filtered queries.
//!
//! Expiry is evaluated lazily on every call by comparing the injected clock
//! against each row's `locked_at`; there is no sweeper. Reads filter ghost
//! rows without deleting them. Acquires evict them.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::locking::{Lock, LockPolicy, LockRequest, LockStatus, ResourceType};
use crate::store::LockStore;
use crate::types::DbId;

/// Grants exclusive, time-bounded edit rights over resources.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
    clock: Arc<dyn Clock>,
    policy: LockPolicy,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>, clock: Arc<dyn Clock>, policy: LockPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    /// Acquire (or re-acquire) the lock on a resource for `requester_id`.
    ///
    /// Re-acquiring an active lock you already hold refreshes it in place and
    /// returns the same lock id. Fails with `LockHeldByAnotherUser` when a
    /// different user holds an active lock; nothing is retried.
    pub async fn acquire_lock(
        &self,
        project_id: DbId,
        resource_type: ResourceType,
        resource_id: DbId,
        requester_id: DbId,
    ) -> CoreResult<Lock> {
        let request = LockRequest {
            project_id,
            resource_type,
            resource_id,
            requester_id,
        };
        let now = self.clock.now();

        match self.store.acquire(&request, now, self.policy.ttl).await {
            Ok(lock) => {
                tracing::info!(
                    lock_id = lock.id,
                    project_id,
                    resource_type = %resource_type,
                    resource_id,
                    user_id = requester_id,
                    "Lock acquired"
                );
                Ok(lock)
            }
            Err(err @ CoreError::LockHeldByAnotherUser { holder_user_id, .. }) => {
                tracing::warn!(
                    project_id,
                    resource_type = %resource_type,
                    resource_id,
                    user_id = requester_id,
                    holder_user_id,
                    "Lock denied"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete a lock. Fails with `NotFound` when the id does not exist.
    pub async fn release_lock(&self, lock_id: DbId) -> CoreResult<()> {
        if !self.store.delete(lock_id).await? {
            return Err(CoreError::NotFound {
                entity: "Lock",
                id: lock_id,
            });
        }
        tracing::info!(lock_id, "Lock released");
        Ok(())
    }

    /// Advance `locked_at` to now.
    ///
    /// Fails with `NotFound` when the id does not exist or the lock has
    /// already lapsed. Caller-is-holder is checked by the calling layer.
    pub async fn refresh_lock(&self, lock_id: DbId) -> CoreResult<Lock> {
        let now = self.clock.now();
        let lock = self
            .store
            .refresh(lock_id, now, self.policy.ttl)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Lock",
                id: lock_id,
            })?;
        tracing::debug!(
            lock_id,
            user_id = lock.user_id,
            expires_at = %lock.expires_at(self.policy.ttl),
            "Lock refreshed"
        );
        Ok(lock)
    }

    /// The active lock on a resource, if any.
    pub async fn get_lock_for_resource(
        &self,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> CoreResult<Option<Lock>> {
        let now = self.clock.now();
        let lock = self
            .store
            .find_by_resource(resource_type, resource_id)
            .await?;
        Ok(lock.filter(|l| l.is_active(now, self.policy.ttl)))
    }

    /// All active locks in a project.
    pub async fn get_locks_for_project(&self, project_id: DbId) -> CoreResult<Vec<Lock>> {
        let now = self.clock.now();
        let mut locks = self.store.list_by_project(project_id).await?;
        locks.retain(|l| l.is_active(now, self.policy.ttl));
        Ok(locks)
    }

    /// Status of a resource from `viewer`'s point of view, with the active
    /// lock it was derived from.
    pub async fn lock_status(
        &self,
        resource_type: ResourceType,
        resource_id: DbId,
        viewer: DbId,
    ) -> CoreResult<(LockStatus, Option<Lock>)> {
        let lock = self.get_lock_for_resource(resource_type, resource_id).await?;
        Ok((LockStatus::for_viewer(lock.as_ref(), viewer), lock))
    }
}
