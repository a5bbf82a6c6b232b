// Lease store - authoritative lease per manipulator, no policy

use super::Lease;
use crate::time::Clock;
use crate::ManipulatorId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Holds at most one lease per manipulator
///
/// Entries are sharded, so operations on one manipulator never wait on
/// another. Every read resolves a lapsed lease to [`Lease::revoked`] before
/// returning it; lapsed entries linger only until [`LeaseStore::purge_expired`].
#[derive(Debug)]
pub struct LeaseStore {
    leases: DashMap<ManipulatorId, Lease>,
    clock: Arc<dyn Clock>,
}

impl LeaseStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: DashMap::new(),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current lease for `id`, revoked if none is recorded or it has lapsed
    pub fn get(&self, id: &ManipulatorId) -> Lease {
        let now = self.clock.now();
        self.leases
            .get(id)
            .map_or_else(Lease::revoked, |entry| entry.resolve(now))
    }

    /// Replace the lease for `id`
    pub fn put(&self, id: ManipulatorId, lease: Lease) {
        self.put_with(id, lease, || {});
    }

    /// Replace the lease for `id`, calling `announce` while the entry is locked
    ///
    /// Writes to one manipulator hold the same entry lock, so anything
    /// `announce` emits is ordered the way the writes were applied.
    /// `announce` must not call back into the store.
    pub fn put_with(&self, id: ManipulatorId, lease: Lease, announce: impl FnOnce()) {
        let entry = self.leases.entry(id);
        announce();
        match entry {
            Entry::Occupied(mut entry) if lease.granted() => {
                entry.insert(lease);
            }
            Entry::Occupied(entry) => {
                entry.remove();
            }
            Entry::Vacant(entry) if lease.granted() => {
                entry.insert(lease);
            }
            Entry::Vacant(_) => {}
        }
    }

    pub fn remove(&self, id: &ManipulatorId) {
        self.put(id.clone(), Lease::revoked());
    }

    /// Drop every lapsed entry, returning how many lapsed
    ///
    /// `on_lapsed` runs for each lapsed manipulator while its shard is
    /// still locked, under the same rule as [`LeaseStore::put_with`].
    pub fn purge_expired(&self, mut on_lapsed: impl FnMut(&ManipulatorId)) -> usize {
        let now = self.clock.now();
        let mut lapsed = 0;
        self.leases.retain(|id, lease| {
            if lease.is_lapsed_at(now) {
                on_lapsed(id);
                lapsed += 1;
                false
            } else {
                lease.granted()
            }
        });
        lapsed
    }

    /// Snapshot of leases that are valid right now
    pub fn active(&self) -> Vec<(ManipulatorId, Lease)> {
        let now = self.clock.now();
        let mut active: Vec<_> = self
            .leases
            .iter()
            .filter(|entry| entry.value().is_valid_at(now))
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }

    /// Number of recorded entries, lapsed ones included
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualClock;
    use std::time::Duration;

    fn store() -> (Arc<ManualClock>, LeaseStore) {
        let clock = Arc::new(ManualClock::new());
        let store = LeaseStore::new(clock.clone());
        (clock, store)
    }

    #[test]
    fn test_get_defaults_to_revoked() {
        let (_clock, store) = store();
        assert_eq!(store.get(&"1".into()), Lease::revoked());
    }

    #[test]
    fn test_put_replaces() {
        let (clock, store) = store();
        let id = ManipulatorId::from("1");
        let first = Lease::until(clock.now() + Duration::from_secs(10));
        let second = Lease::until(clock.now() + Duration::from_secs(50));

        store.put(id.clone(), first);
        store.put(id.clone(), second);

        assert_eq!(store.get(&id), second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_revoked_clears_entry() {
        let (clock, store) = store();
        let id = ManipulatorId::from("1");

        store.put(id.clone(), Lease::until(clock.now() + Duration::from_secs(10)));
        store.put(id.clone(), Lease::revoked());

        assert_eq!(store.get(&id), Lease::revoked());
        assert!(store.is_empty());

        store.put(id.clone(), Lease::until(clock.now() + Duration::from_secs(10)));
        store.remove(&id);
        assert!(store.is_empty());
    }

    #[test]
    fn test_lapsed_lease_reads_as_revoked() {
        let (clock, store) = store();
        let id = ManipulatorId::from("1");

        store.put(id.clone(), Lease::until(clock.now() + Duration::from_secs(10)));
        clock.advance(Duration::from_secs(10));

        assert_eq!(store.get(&id), Lease::revoked());
        // Still recorded until purged
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_expired_reports_lapsed_only() {
        let (clock, store) = store();
        let now = clock.now();

        store.put("short".into(), Lease::until(now + Duration::from_secs(1)));
        store.put("long".into(), Lease::until(now + Duration::from_secs(100)));
        clock.advance(Duration::from_secs(2));

        let mut lapsed = Vec::new();
        assert_eq!(store.purge_expired(|id| lapsed.push(id.clone())), 1);
        assert_eq!(lapsed, vec![ManipulatorId::from("short")]);
        assert_eq!(store.purge_expired(|_| panic!("nothing left to lapse")), 0);
        assert_eq!(store.len(), 1);

        let active = store.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, ManipulatorId::from("long"));
    }
}
