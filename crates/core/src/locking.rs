//! Resource lock constants, types, and expiry rules.
//!
//! Everything here is pure: no storage, no clock reads. The lock manager and
//! each storage backend call into these functions so that "is this lock
//! still live" has exactly one definition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Lock duration constants
// ---------------------------------------------------------------------------

/// Default lock time-to-live in seconds (2 hours).
pub const DEFAULT_LOCK_TTL_SECS: i64 = 2 * 60 * 60;

/// Default client auto-refresh cadence in seconds (30 minutes).
///
/// Kept at a quarter of the TTL so a few missed refreshes do not drop a lock.
pub const DEFAULT_LOCK_REFRESH_INTERVAL_SECS: i64 = 30 * 60;

/// Longest TTL a policy accepts in seconds (30 days).
pub const MAX_LOCK_TTL_SECS: i64 = 30 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// The kinds of content that can be locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Section,
    Block,
    Thread,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [Self::Section, Self::Block, Self::Thread];

    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Block => "block",
            Self::Thread => "thread",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid resource_type '{s}'. Must be one of: section, block, thread"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Lock
// ---------------------------------------------------------------------------

/// A persisted lock row.
///
/// A row is only meaningful while [`Lock::is_active`] holds; past its TTL it
/// is a ghost that every read filters out and every acquire may evict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub id: DbId,
    pub project_id: DbId,
    pub resource_type: ResourceType,
    pub resource_id: DbId,
    pub user_id: DbId,
    pub locked_at: Timestamp,
}

impl Lock {
    /// The instant after which this lock stops being active.
    ///
    /// Saturates at the latest representable instant instead of overflowing.
    pub fn expires_at(&self, ttl: Duration) -> Timestamp {
        self.locked_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_active(&self, now: Timestamp, ttl: Duration) -> bool {
        !is_expired(now, self.locked_at, ttl)
    }

    pub fn is_held_by(&self, user_id: DbId) -> bool {
        self.user_id == user_id
    }
}

/// Input for an acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    pub project_id: DbId,
    pub resource_type: ResourceType,
    pub resource_id: DbId,
    pub requester_id: DbId,
}

/// Returns `true` once `now - locked_at` has reached `ttl`.
pub fn is_expired(now: Timestamp, locked_at: Timestamp, ttl: Duration) -> bool {
    now.signed_duration_since(locked_at) >= ttl
}

// ---------------------------------------------------------------------------
// Acquire decision
// ---------------------------------------------------------------------------

/// What a storage backend must do, atomically, to satisfy an acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquirePlan {
    /// The resource is free. Delete `evict` (an expired row) if present, then
    /// insert a fresh lock owned by the requester.
    Insert { evict: Option<DbId> },
    /// The requester already holds an active lock; bump its `locked_at`.
    Refresh { lock_id: DbId },
    /// Someone else holds an active lock.
    Deny { holder: Lock },
}

/// Decide how an acquire resolves against the row currently persisted for
/// the resource (if any).
pub fn plan_acquire(
    existing: Option<&Lock>,
    requester_id: DbId,
    now: Timestamp,
    ttl: Duration,
) -> AcquirePlan {
    match existing {
        None => AcquirePlan::Insert { evict: None },
        Some(lock) if !lock.is_active(now, ttl) => AcquirePlan::Insert {
            evict: Some(lock.id),
        },
        Some(lock) if lock.is_held_by(requester_id) => AcquirePlan::Refresh { lock_id: lock.id },
        Some(lock) => AcquirePlan::Deny {
            holder: lock.clone(),
        },
    }
}

impl CoreError {
    /// The error reported when `holder` blocks an acquire.
    pub fn lock_held(holder: &Lock, ttl: Duration) -> Self {
        Self::LockHeldByAnotherUser {
            resource_type: holder.resource_type,
            resource_id: holder.resource_id,
            holder_user_id: holder.user_id,
            expires_at: holder.expires_at(ttl),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Why a [`LockPolicy`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LockPolicyError {
    #[error("Lock TTL must be between 1s and {max}s, got {got}s")]
    TtlOutOfRange { got: i64, max: i64 },

    #[error("Lock refresh interval must be positive, got {0}s")]
    NonPositiveRefreshInterval(i64),

    #[error("Lock refresh interval ({refresh}s) must be shorter than the TTL ({ttl}s)")]
    RefreshNotShorterThanTtl { refresh: i64, ttl: i64 },
}

/// Lock timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Age at which a lock stops being active.
    pub ttl: Duration,
    /// How often a holder's client is expected to refresh. Advisory; only
    /// reported to clients.
    pub refresh_interval: Duration,
}

impl LockPolicy {
    /// Build a policy, rejecting a TTL outside `1..=MAX_LOCK_TTL_SECS` or a
    /// refresh interval that would let the lock lapse between refreshes.
    pub fn new(ttl: Duration, refresh_interval: Duration) -> Result<Self, LockPolicyError> {
        if ttl <= Duration::zero() || ttl > Duration::seconds(MAX_LOCK_TTL_SECS) {
            return Err(LockPolicyError::TtlOutOfRange {
                got: ttl.num_seconds(),
                max: MAX_LOCK_TTL_SECS,
            });
        }
        if refresh_interval <= Duration::zero() {
            return Err(LockPolicyError::NonPositiveRefreshInterval(
                refresh_interval.num_seconds(),
            ));
        }
        if refresh_interval >= ttl {
            return Err(LockPolicyError::RefreshNotShorterThanTtl {
                refresh: refresh_interval.num_seconds(),
                ttl: ttl.num_seconds(),
            });
        }
        Ok(Self {
            ttl,
            refresh_interval,
        })
    }
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_LOCK_TTL_SECS),
            refresh_interval: Duration::seconds(DEFAULT_LOCK_REFRESH_INTERVAL_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// Client-facing status
// ---------------------------------------------------------------------------

/// Lock status of a resource as seen by one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    /// No active lock.
    Available,
    /// The caller holds the active lock.
    Acquired,
    /// Someone else holds the active lock.
    Blocked,
    /// An acquire/release is in flight. Only clients produce this.
    Pending,
}

impl LockStatus {
    /// Derive the status of a resource for `viewer` from its active lock.
    ///
    /// `active_lock` must already be expiry-filtered.
    pub fn for_viewer(active_lock: Option<&Lock>, viewer: DbId) -> Self {
        match active_lock {
            None => Self::Available,
            Some(lock) if lock.is_held_by(viewer) => Self::Acquired,
            Some(_) => Self::Blocked,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate a resource id from an external caller.
pub fn validate_resource_id(resource_id: DbId) -> Result<(), String> {
    if resource_id <= 0 {
        return Err(format!("resource_id must be positive, got {resource_id}"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn lock_held_by(user_id: DbId, locked_at: Timestamp) -> Lock {
        Lock {
            id: 11,
            project_id: 1,
            resource_type: ResourceType::Section,
            resource_id: 5,
            user_id,
            locked_at,
        }
    }

    fn ttl() -> Duration {
        Duration::seconds(DEFAULT_LOCK_TTL_SECS)
    }

    // -----------------------------------------------------------------------
    // Resource types
    // -----------------------------------------------------------------------

    #[test]
    fn resource_type_parses_known_strings() {
        for t in ResourceType::ALL {
            assert_eq!(t.as_str().parse::<ResourceType>().unwrap(), t);
        }
    }

    #[test]
    fn resource_type_rejects_unknown_strings() {
        for bad in ["", "Section", "comment", "BLOCK"] {
            let err = bad.parse::<ResourceType>().unwrap_err();
            assert!(err.to_string().contains("Invalid resource_type"));
        }
    }

    #[test]
    fn resource_type_serializes_lowercase() {
        let json = serde_json::to_string(&ResourceType::Thread).unwrap();
        assert_eq!(json, "\"thread\"");
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    #[test]
    fn lock_is_active_just_before_ttl() {
        let lock = lock_held_by(1, t0());
        let now = t0() + ttl() - Duration::milliseconds(1);
        assert!(lock.is_active(now, ttl()));
    }

    #[test]
    fn lock_expires_exactly_at_ttl() {
        assert!(is_expired(t0() + ttl(), t0(), ttl()));
        assert!(is_expired(t0() + ttl() + Duration::seconds(1), t0(), ttl()));
    }

    #[test]
    fn expires_at_adds_ttl() {
        let lock = lock_held_by(1, t0());
        assert_eq!(lock.expires_at(ttl()), t0() + Duration::hours(2));
    }

    // -----------------------------------------------------------------------
    // Acquire planning
    // -----------------------------------------------------------------------

    #[test]
    fn plan_inserts_when_free() {
        assert_eq!(
            plan_acquire(None, 1, t0(), ttl()),
            AcquirePlan::Insert { evict: None }
        );
    }

    #[test]
    fn plan_refreshes_own_active_lock() {
        let lock = lock_held_by(1, t0());
        let now = t0() + Duration::minutes(10);
        assert_eq!(
            plan_acquire(Some(&lock), 1, now, ttl()),
            AcquirePlan::Refresh { lock_id: 11 }
        );
    }

    #[test]
    fn plan_denies_foreign_active_lock() {
        let lock = lock_held_by(2, t0());
        let now = t0() + Duration::minutes(10);
        assert_eq!(
            plan_acquire(Some(&lock), 1, now, ttl()),
            AcquirePlan::Deny { holder: lock }
        );
    }

    #[test]
    fn plan_evicts_expired_lock_of_anyone() {
        let now = t0() + ttl() + Duration::seconds(1);
        for holder in [1, 2] {
            let lock = lock_held_by(holder, t0());
            assert_eq!(
                plan_acquire(Some(&lock), 1, now, ttl()),
                AcquirePlan::Insert { evict: Some(11) }
            );
        }
    }

    // -----------------------------------------------------------------------
    // Status derivation
    // -----------------------------------------------------------------------

    #[test]
    fn status_for_viewer() {
        let lock = lock_held_by(1, t0());
        assert_eq!(LockStatus::for_viewer(None, 1), LockStatus::Available);
        assert_eq!(LockStatus::for_viewer(Some(&lock), 1), LockStatus::Acquired);
        assert_eq!(LockStatus::for_viewer(Some(&lock), 2), LockStatus::Blocked);
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    #[test]
    fn default_policy_refreshes_at_quarter_ttl() {
        let policy = LockPolicy::default();
        assert_eq!(policy.ttl, Duration::hours(2));
        assert_eq!(policy.refresh_interval * 4, policy.ttl);
        assert!(LockPolicy::new(policy.ttl, policy.refresh_interval).is_ok());
    }

    #[test]
    fn policy_rejects_refresh_not_shorter_than_ttl() {
        let err = LockPolicy::new(Duration::minutes(10), Duration::minutes(10)).unwrap_err();
        assert_eq!(
            err,
            LockPolicyError::RefreshNotShorterThanTtl {
                refresh: 600,
                ttl: 600
            }
        );
        assert!(err.to_string().contains("shorter than the TTL"));
    }

    #[test]
    fn policy_rejects_non_positive_durations() {
        assert_matches!(
            LockPolicy::new(Duration::zero(), Duration::minutes(1)),
            Err(LockPolicyError::TtlOutOfRange { got: 0, .. })
        );
        assert_matches!(
            LockPolicy::new(Duration::minutes(10), Duration::seconds(-1)),
            Err(LockPolicyError::NonPositiveRefreshInterval(-1))
        );
    }

    #[test]
    fn policy_rejects_ttl_above_maximum() {
        let max = Duration::seconds(MAX_LOCK_TTL_SECS);
        assert!(LockPolicy::new(max, Duration::minutes(30)).is_ok());
        assert_matches!(
            LockPolicy::new(max + Duration::seconds(1), Duration::minutes(30)),
            Err(LockPolicyError::TtlOutOfRange { max: MAX_LOCK_TTL_SECS, .. })
        );
        assert_matches!(
            LockPolicy::new(Duration::seconds(10_000_000_000_000), Duration::minutes(30)),
            Err(LockPolicyError::TtlOutOfRange { .. })
        );
    }

    #[test]
    fn expires_at_saturates_instead_of_overflowing() {
        let lock = lock_held_by(1, t0());
        let expires = lock.expires_at(Duration::seconds(10_000_000_000_000));
        assert_eq!(expires, DateTime::<Utc>::MAX_UTC);
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn resource_id_must_be_positive() {
        assert!(validate_resource_id(1).is_ok());
        assert!(validate_resource_id(0).unwrap_err().contains("positive"));
        assert!(validate_resource_id(-3).is_err());
    }
}
