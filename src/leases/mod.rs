// Write-permission leases for manipulators
//
// Provides time-bounded movement authority with:
// - one lease per manipulator, last grant wins
// - lazy expiry on a monotonic clock
// - an optional reaper that announces lapsed leases

pub mod lease;
pub mod manager;
pub mod store;

pub use lease::Lease;
pub use manager::{LeaseEvent, LeaseManager};
pub use store::LeaseStore;
