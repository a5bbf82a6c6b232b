// Core lease data structure

use std::time::Instant;

/// Write permission for one manipulator
///
/// A lease carries no holder: whoever asked last owns the manipulator until
/// its deadline. Only `revoked()` and `until()` build one, so a lease has a
/// deadline exactly when it is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lease {
    expires_at: Option<Instant>,
}

impl Lease {
    /// The lease every manipulator starts with
    pub const fn revoked() -> Self {
        Self { expires_at: None }
    }

    /// A granted lease ending at `expires_at`
    pub const fn until(expires_at: Instant) -> Self {
        Self {
            expires_at: Some(expires_at),
        }
    }

    /// Whether write permission was granted, ignoring expiry
    pub const fn granted(&self) -> bool {
        self.expires_at.is_some()
    }

    pub const fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Check if the lease still permits writes at `now`
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now < deadline)
    }

    /// Check if a granted lease has run past its deadline
    pub fn is_lapsed_at(&self, now: Instant) -> bool {
        self.granted() && !self.is_valid_at(now)
    }

    /// Resolve this lease as seen at `now`
    ///
    /// A lapsed lease reads as revoked.
    pub fn resolve(self, now: Instant) -> Self {
        if self.is_valid_at(now) {
            self
        } else {
            Self::revoked()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_is_revoked() {
        let lease = Lease::default();
        assert_eq!(lease, Lease::revoked());
        assert!(!lease.granted());
        assert!(lease.expires_at().is_none());
        assert!(!lease.is_valid_at(Instant::now()));
    }

    #[test]
    fn test_granted_iff_deadline() {
        let deadline = Instant::now() + Duration::from_secs(5);

        let granted = Lease::until(deadline);
        assert!(granted.granted());
        assert_eq!(granted.expires_at(), Some(deadline));

        let revoked = Lease::revoked();
        assert!(!revoked.granted());
        assert_eq!(revoked.expires_at(), None);
    }

    #[test]
    fn test_lease_expiration() {
        let now = Instant::now();
        let lease = Lease::until(now + Duration::from_secs(30));

        assert!(lease.is_valid_at(now));
        assert!(lease.is_valid_at(now + Duration::from_millis(29_999)));
        assert!(!lease.is_valid_at(now + Duration::from_secs(30)));
        assert!(lease.is_lapsed_at(now + Duration::from_secs(31)));
        assert!(!Lease::revoked().is_lapsed_at(now));
    }

    #[test]
    fn test_resolve_lapsed_reads_as_revoked() {
        let now = Instant::now();
        let lease = Lease::until(now + Duration::from_secs(1));

        assert_eq!(lease.resolve(now), lease);
        assert_eq!(lease.resolve(now + Duration::from_secs(2)), Lease::revoked());
        // a lapsed lease still records that it was granted until resolved
        assert!(lease.granted());
    }
}
