//! Client-side cache of the per-item edit lock.
//!
//! The server owns the lock; this only tracks what the last response said,
//! guarantees at most one acquire/renew request in flight and computes when
//! to renew. Timers are identified by a sequence number so a timer scheduled
//! before a later grant, denial or navigation is recognized as stale.

use std::time::Duration;

use chrono::{DateTime, Utc};
use labeldesk_api::Role;

use crate::constants::lease::{MAX_TTL_SECONDS, MIN_TTL_SECONDS};

/// Last known lock state for the current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// No lock held; `reason` explains a denial or failure
    Unlocked { reason: Option<String> },
    /// Lock held until `expires_at`
    Locked { expires_at: DateTime<Utc> },
}

impl Default for LockState {
    fn default() -> Self {
        LockState::Unlocked { reason: None }
    }
}

/// A renewal timer the runtime should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalTimer {
    pub seq: u64,
    pub after: Duration,
}

/// Lock/lease bookkeeping for one item at a time.
#[derive(Debug, Clone)]
pub struct LeaseManager {
    state: LockState,
    role: Role,
    ttl_seconds: u32,
    renew_lead: Duration,
    in_flight: bool,
    timer_seq: u64,
    /// An acquire was sent for the current item, so leaving it needs a release
    requested: bool,
}

impl LeaseManager {
    pub fn new(ttl_seconds: u32, renew_lead: Duration, role: Role) -> Self {
        Self {
            state: LockState::default(),
            role,
            ttl_seconds: clamp_ttl(ttl_seconds),
            renew_lead,
            in_flight: false,
            timer_seq: 0,
            requested: false,
        }
    }

    pub fn state(&self) -> &LockState {
        &self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Requested lease length, already clamped to the accepted range.
    pub fn ttl_seconds(&self) -> u32 {
        self.ttl_seconds
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, LockState::Locked { .. })
    }

    /// Whether edits are allowed. Admins may edit without a held lock; the
    /// server still validates their saves.
    pub fn is_editable(&self) -> bool {
        self.is_locked() || self.role.bypasses_lock_gate()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Denial or failure message, if the last request failed.
    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            LockState::Unlocked { reason } => reason.as_deref(),
            LockState::Locked { .. } => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            LockState::Locked { expires_at } => Some(expires_at),
            LockState::Unlocked { .. } => None,
        }
    }

    /// Reserve the single request slot. Returns `false` while a request is
    /// already in flight.
    pub fn begin_acquire(&mut self) -> bool {
        if self.in_flight {
            log::debug!("🔒 Lock request already in flight; not sending another");
            return false;
        }
        self.in_flight = true;
        self.requested = true;
        true
    }

    /// The server granted (or extended) the lease.
    pub fn on_granted(&mut self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> RenewalTimer {
        self.in_flight = false;
        self.state = LockState::Locked { expires_at };
        self.timer_seq += 1;
        let after = renewal_delay(expires_at, now, self.renew_lead);
        log::info!(
            "🔒 Lock held until {} (renewing in {:.0}s)",
            expires_at.format("%H:%M:%S"),
            after.as_secs_f64()
        );
        RenewalTimer {
            seq: self.timer_seq,
            after,
        }
    }

    /// The acquire or renewal failed. Editing stops until a later grant.
    pub fn on_failed(&mut self, reason: impl Into<String>) {
        let mut reason = reason.into();
        if reason.trim().is_empty() {
            reason = "lock request failed".to_string();
        }
        log::warn!("🔓 Lock unavailable: {}", reason);
        self.in_flight = false;
        self.timer_seq += 1;
        self.state = LockState::Unlocked {
            reason: Some(reason),
        };
    }

    /// Check whether a fired timer is still the current one.
    pub fn timer_is_current(&self, seq: u64) -> bool {
        seq == self.timer_seq
    }

    /// Forget everything about the current item. Returns whether an acquire
    /// had been sent, i.e. whether the caller should send a release.
    pub fn reset(&mut self) -> bool {
        let requested = self.requested;
        self.state = LockState::default();
        self.in_flight = false;
        self.requested = false;
        self.timer_seq += 1;
        requested
    }
}

/// Clamp a requested lease length to what the backend accepts.
pub fn clamp_ttl(ttl_seconds: u32) -> u32 {
    ttl_seconds.clamp(MIN_TTL_SECONDS, MAX_TTL_SECONDS)
}

/// Delay before renewing a lease expiring at `expires_at`.
///
/// `max(remaining - lead, remaining / 2)`: renew `lead` before expiry, but for
/// short leases no later than halfway. Always strictly before expiry while
/// time remains; an already expired lease renews immediately.
pub fn renewal_delay(expires_at: DateTime<Utc>, now: DateTime<Utc>, lead: Duration) -> Duration {
    let remaining = match (expires_at - now).to_std() {
        Ok(remaining) if !remaining.is_zero() => remaining,
        _ => return Duration::ZERO,
    };
    remaining.saturating_sub(lead).max(remaining / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn manager() -> LeaseManager {
        LeaseManager::new(300, Duration::from_secs(30), Role::Annotator)
    }

    #[test]
    fn ttl_is_clamped() {
        assert_eq!(clamp_ttl(5), 30);
        assert_eq!(clamp_ttl(300), 300);
        assert_eq!(clamp_ttl(100_000), 3600);
    }

    #[test]
    fn renewal_is_lead_before_expiry_for_long_leases() {
        let expires = t0() + chrono::Duration::seconds(300);
        let delay = renewal_delay(expires, t0(), Duration::from_secs(30));
        assert_eq!(delay, Duration::from_secs(270));
    }

    #[test]
    fn renewal_is_halfway_for_short_leases() {
        let expires = t0() + chrono::Duration::seconds(40);
        let delay = renewal_delay(expires, t0(), Duration::from_secs(30));
        assert_eq!(delay, Duration::from_secs(20));
    }

    #[test]
    fn renewal_always_strictly_before_expiry() {
        for secs in [1_i64, 2, 30, 31, 59, 60, 61, 600, 3600] {
            let expires = t0() + chrono::Duration::seconds(secs);
            let delay = renewal_delay(expires, t0(), Duration::from_secs(30));
            assert!(delay < Duration::from_secs(secs as u64), "ttl {}", secs);
        }
    }

    #[test]
    fn expired_lease_renews_immediately() {
        let expires = t0() - chrono::Duration::seconds(5);
        assert_eq!(
            renewal_delay(expires, t0(), Duration::from_secs(30)),
            Duration::ZERO
        );
    }

    #[test]
    fn only_one_request_in_flight() {
        let mut lease = manager();
        assert!(lease.begin_acquire());
        assert!(!lease.begin_acquire());
        lease.on_granted(t0() + chrono::Duration::seconds(300), t0());
        assert!(lease.begin_acquire());
    }

    #[test]
    fn failed_renewal_unlocks_with_reason() {
        let mut lease = manager();
        lease.begin_acquire();
        lease.on_granted(t0() + chrono::Duration::seconds(300), t0());
        assert!(lease.is_editable());

        lease.begin_acquire();
        lease.on_failed("");
        assert!(!lease.is_locked());
        assert!(!lease.is_editable());
        assert_eq!(lease.reason(), Some("lock request failed"));
    }

    #[test]
    fn new_grant_invalidates_old_timer() {
        let mut lease = manager();
        lease.begin_acquire();
        let first = lease.on_granted(t0() + chrono::Duration::seconds(300), t0());
        lease.begin_acquire();
        let second = lease.on_granted(t0() + chrono::Duration::seconds(600), t0());
        assert!(!lease.timer_is_current(first.seq));
        assert!(lease.timer_is_current(second.seq));
    }

    #[test]
    fn reset_reports_whether_release_is_needed() {
        let mut lease = manager();
        assert!(!lease.reset());
        lease.begin_acquire();
        lease.on_failed("locked by another user");
        assert!(lease.reset());
        assert_eq!(lease.state(), &LockState::Unlocked { reason: None });
    }

    #[test]
    fn admin_is_editable_without_lock() {
        let lease = LeaseManager::new(300, Duration::from_secs(30), Role::Admin);
        assert!(!lease.is_locked());
        assert!(lease.is_editable());
    }
}
