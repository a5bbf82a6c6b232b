// Lease manager - grant, revoke and writability checks

use super::{Lease, LeaseStore};
use crate::time::{hours_to_duration, Clock};
use crate::{Error, ManipulatorId, Result};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 64;

/// Lease lifecycle notification
///
/// Events for one manipulator are broadcast in the order the store applied
/// them, so the last event seen for an id matches its stored lease.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaseEvent {
    Granted { manipulator_id: ManipulatorId, hours: f64 },
    Revoked { manipulator_id: ManipulatorId },
    /// Emitted by [`LeaseManager::reap`] once per lapsed lease
    Expired { manipulator_id: ManipulatorId },
}

/// Enforces the grant/revoke protocol on top of a [`LeaseStore`]
///
/// Grants never queue and never fail for a valid duration: a later grant
/// silently replaces an earlier one. Expiry is detected lazily on read;
/// [`LeaseManager::spawn_reaper`] only garbage-collects and announces.
#[derive(Debug)]
pub struct LeaseManager {
    store: LeaseStore,
    events: broadcast::Sender<LeaseEvent>,
}

impl LeaseManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: LeaseStore::new(clock),
            events,
        }
    }

    pub fn store(&self) -> &LeaseStore {
        &self.store
    }

    /// Grant write permission on `id` for `hours`
    ///
    /// `hours == 0` revokes immediately. Negative or non-finite `hours` are
    /// rejected and leave the current lease untouched.
    pub fn grant(&self, id: &ManipulatorId, hours: f64) -> Result<Lease> {
        let duration = hours_to_duration(hours).ok_or_else(|| {
            Error::invalid(format!("hours must be finite and non-negative, got {hours}"))
        })?;
        if duration.is_zero() {
            return Ok(self.revoke(id));
        }

        let now = self.store.clock().now();
        let expires_at = now
            .checked_add(duration)
            .ok_or_else(|| Error::invalid(format!("lease of {hours} hours is out of range")))?;

        let lease = Lease::until(expires_at);
        self.store.put_with(id.clone(), lease, || {
            info!(manipulator_id = %id, hours, "write lease granted");
            let _ = self.events.send(LeaseEvent::Granted {
                manipulator_id: id.clone(),
                hours,
            });
        });
        Ok(lease)
    }

    /// Revoke write permission on `id`, whether or not a lease exists
    pub fn revoke(&self, id: &ManipulatorId) -> Lease {
        self.store.put_with(id.clone(), Lease::revoked(), || {
            info!(manipulator_id = %id, "write lease revoked");
            let _ = self.events.send(LeaseEvent::Revoked {
                manipulator_id: id.clone(),
            });
        });
        Lease::revoked()
    }

    /// Current lease for `id`, lapsed leases read as revoked
    pub fn lease(&self, id: &ManipulatorId) -> Lease {
        self.store.get(id)
    }

    /// Check if movement commands for `id` may proceed right now
    pub fn is_writable(&self, id: &ManipulatorId) -> bool {
        let now = self.store.clock().now();
        self.store.get(id).is_valid_at(now)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeaseEvent> {
        self.events.subscribe()
    }

    /// Drop lapsed leases and announce each one, returning how many lapsed
    pub fn reap(&self) -> usize {
        self.store.purge_expired(|id| {
            info!(manipulator_id = %id, "write lease expired");
            let _ = self.events.send(LeaseEvent::Expired {
                manipulator_id: id.clone(),
            });
        })
    }

    /// Run [`LeaseManager::reap`] every `interval` until the manager is dropped
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        let interval = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    debug!("lease manager dropped, stopping reaper");
                    break;
                };
                manager.reap();
            }
        })
    }
}
