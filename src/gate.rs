// Command gate - the only path from a movement request to the driver

use crate::driver::Driver;
use crate::leases::LeaseManager;
use crate::message::{Movement, MovementRequest};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Refuses movement commands for manipulators without a valid lease
///
/// Writability is checked once, before the driver is called. A lease that
/// lapses while the driver is moving does not abort the move.
#[derive(Debug, Clone)]
pub struct CommandGate {
    leases: Arc<LeaseManager>,
    driver: Arc<dyn Driver>,
}

impl CommandGate {
    pub fn new(leases: Arc<LeaseManager>, driver: Arc<dyn Driver>) -> Self {
        Self { leases, driver }
    }

    pub async fn submit(&self, request: &MovementRequest) -> Result<Movement> {
        let id = request.manipulator_id();
        if !self.leases.is_writable(id) {
            warn!(manipulator_id = %id, "movement refused without write lease");
            return Err(Error::PermissionDenied {
                manipulator_id: id.clone(),
            });
        }

        debug!(manipulator_id = %id, ?request, "forwarding movement to driver");
        self.driver.move_to(id, &request.target(), request.speed()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestLink;
    use std::time::Duration;

    fn goto(id: &str) -> MovementRequest {
        MovementRequest::GotoPosition {
            manipulator_id: id.into(),
            pos: vec![1.0, 2.0, 3.0],
            speed: 10,
        }
    }

    #[tokio::test]
    async fn test_denied_without_lease() {
        let TestLink { gate, driver, .. } = TestLink::new();

        let err = gate.submit(&goto("2")).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
        assert_eq!(driver.move_calls(), 0);
    }

    #[tokio::test]
    async fn test_forwarded_with_lease() {
        let TestLink { gate, leases, driver, .. } = TestLink::new();
        leases.grant(&"1".into(), 1.0).unwrap();

        let moved = gate.submit(&goto("1")).await.unwrap();
        assert_eq!(moved, Movement::Position(vec![1.0, 2.0, 3.0]));

        let moves = driver.moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].0.as_str(), "1");
        assert_eq!(moves[0].2, 10);
    }

    #[tokio::test]
    async fn test_denied_after_lapse() {
        let TestLink { gate, leases, driver, clock, .. } = TestLink::new();

        leases.grant(&"1".into(), 1.0).unwrap();
        clock.advance(Duration::from_secs(3600));

        assert!(gate.submit(&goto("1")).await.is_err());
        assert_eq!(driver.move_calls(), 0);
    }

    #[tokio::test]
    async fn test_driver_error_passes_through() {
        let TestLink { gate, leases, driver, .. } = TestLink::new();
        driver.fail_moves_with("Motor fault");
        leases.grant(&"1".into(), 1.0).unwrap();

        let err = gate.submit(&goto("1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Motor fault");
    }
}
