use crate::{
    driver::{Driver, ManipulatorInfo},
    gate::CommandGate,
    leases::LeaseManager,
    message::{Movement, Target},
    service::Link,
    time::ManualClock,
    Error, ManipulatorId, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Driver stub that records every call and echoes movement targets back
#[derive(Debug, Default)]
pub struct RecordingDriver {
    moves: Mutex<Vec<(ManipulatorId, Target, u32)>>,
    positions: DashMap<ManipulatorId, Vec<f64>>,
    inside: DashMap<ManipulatorId, bool>,
    stops: AtomicUsize,
    move_failure: Mutex<Option<String>>,
    query_failure: Mutex<Option<String>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_calls(&self) -> usize {
        self.moves.lock().len()
    }

    pub fn moves(&self) -> Vec<(ManipulatorId, Target, u32)> {
        self.moves.lock().clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn inside_brain(&self, id: &ManipulatorId) -> Option<bool> {
        self.inside.get(id).map(|v| *v)
    }

    /// Make every following move fail with `message`
    pub fn fail_moves_with(&self, message: &str) {
        *self.move_failure.lock() = Some(message.to_string());
    }

    /// Make every following query fail with `message`
    pub fn fail_queries_with(&self, message: &str) {
        *self.query_failure.lock() = Some(message.to_string());
    }

    fn query_failure(&self) -> Result<()> {
        match self.query_failure.lock().as_ref() {
            Some(message) => Err(Error::driver(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn enumerate(&self) -> Result<Vec<ManipulatorInfo>> {
        self.query_failure()?;
        Ok(vec![
            ManipulatorInfo::new("1", 4, [20.0, 20.0, 20.0]),
            ManipulatorInfo::new("2", 4, [20.0, 20.0, 20.0]),
        ])
    }

    async fn position(&self, id: &ManipulatorId) -> Result<Vec<f64>> {
        self.query_failure()?;
        Ok(self
            .positions
            .get(id)
            .map_or_else(|| vec![0.0; 4], |p| p.clone()))
    }

    async fn angles(&self, _id: &ManipulatorId) -> Result<[f64; 3]> {
        self.query_failure()?;
        Ok([0.0; 3])
    }

    async fn shank_count(&self, _id: &ManipulatorId) -> Result<u32> {
        self.query_failure()?;
        Ok(1)
    }

    async fn move_to(&self, id: &ManipulatorId, target: &Target, speed: u32) -> Result<Movement> {
        self.moves.lock().push((id.clone(), target.clone(), speed));
        if let Some(message) = self.move_failure.lock().as_ref() {
            return Err(Error::driver(message.clone()));
        }
        Ok(match target {
            Target::Position(pos) => {
                self.positions.insert(id.clone(), pos.clone());
                Movement::Position(pos.clone())
            }
            Target::Depth(depth) => Movement::Depth(*depth),
        })
    }

    async fn set_inside_brain(&self, id: &ManipulatorId, inside: bool) -> Result<bool> {
        self.inside.insert(id.clone(), inside);
        Ok(inside)
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A link wired to a manual clock and a recording driver
pub struct TestLink {
    pub clock: Arc<ManualClock>,
    pub leases: Arc<LeaseManager>,
    pub driver: Arc<RecordingDriver>,
    pub gate: CommandGate,
    pub link: Link,
}

impl TestLink {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new());
        let leases = Arc::new(LeaseManager::new(clock.clone()));
        let driver = Arc::new(RecordingDriver::new());
        Self {
            gate: CommandGate::new(leases.clone(), driver.clone()),
            link: Link::new(leases.clone(), driver.clone()),
            clock,
            leases,
            driver,
        }
    }
}

impl Default for TestLink {
    fn default() -> Self {
        Self::new()
    }
}
