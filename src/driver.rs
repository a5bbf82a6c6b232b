use crate::config::SimulatedConfig;
use crate::message::{Movement, Target};
use crate::{Error, ManipulatorId, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Physical envelope of one manipulator, fixed once enumerated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulatorInfo {
    pub manipulator_id: ManipulatorId,
    pub num_axes: u32,
    /// Size of the movement space in mm, first 3 axes
    pub dimensions: [f64; 3],
}

impl ManipulatorInfo {
    pub fn new(manipulator_id: impl Into<ManipulatorId>, num_axes: u32, dimensions: [f64; 3]) -> Self {
        Self {
            manipulator_id: manipulator_id.into(),
            num_axes,
            dimensions,
        }
    }
}

/// Hardware collaborator that actually moves manipulators
///
/// Implementations report failures as [`Error::Driver`]; the message reaches
/// the client unchanged.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    async fn enumerate(&self) -> Result<Vec<ManipulatorInfo>>;
    async fn position(&self, id: &ManipulatorId) -> Result<Vec<f64>>;
    async fn angles(&self, id: &ManipulatorId) -> Result<[f64; 3]>;
    async fn shank_count(&self, id: &ManipulatorId) -> Result<u32>;
    async fn move_to(&self, id: &ManipulatorId, target: &Target, speed: u32) -> Result<Movement>;
    async fn set_inside_brain(&self, id: &ManipulatorId, inside: bool) -> Result<bool>;
    /// Halt every manipulator
    async fn stop(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct SimulatedManipulator {
    info: ManipulatorInfo,
    position: Vec<f64>,
    angles: [f64; 3],
    shank_count: u32,
    inside_brain: bool,
}

impl SimulatedManipulator {
    fn depth_axis(&self) -> usize {
        if self.info.num_axes >= 4 {
            3
        } else {
            2
        }
    }

    fn axis_limit(&self, axis: usize) -> f64 {
        self.info.dimensions[axis.min(2)]
    }

    fn check_in_range(&self, axis: usize, value: f64) -> Result<()> {
        let limit = self.axis_limit(axis);
        if (0.0..=limit).contains(&value) {
            Ok(())
        } else {
            Err(Error::driver(format!(
                "Target {value} on axis {axis} is outside 0..={limit} for manipulator {}",
                self.info.manipulator_id
            )))
        }
    }
}

/// In-memory manipulators for running without hardware
///
/// Moves complete after `move_latency` unless [`Driver::stop`] interrupts them.
#[derive(Debug)]
pub struct SimulatedDriver {
    manipulators: DashMap<ManipulatorId, SimulatedManipulator>,
    move_latency: Duration,
    halt: Notify,
}

impl SimulatedDriver {
    pub fn new(move_latency: Duration) -> Self {
        Self {
            manipulators: DashMap::new(),
            move_latency,
            halt: Notify::new(),
        }
    }

    pub fn from_config(config: &SimulatedConfig) -> Self {
        let driver = Self::new(config.move_latency);
        for n in 1..=config.manipulators {
            let info = ManipulatorInfo::new(n.to_string(), config.num_axes, config.dimensions);
            driver.add(info, config.shank_count);
        }
        driver
    }

    /// Register a manipulator at the origin
    pub fn add(&self, info: ManipulatorInfo, shank_count: u32) {
        let axes = usize::try_from(info.num_axes).unwrap_or(usize::MAX).min(4);
        self.manipulators.insert(
            info.manipulator_id.clone(),
            SimulatedManipulator {
                position: vec![0.0; axes],
                angles: [0.0; 3],
                shank_count,
                inside_brain: false,
                info,
            },
        );
    }

    /// Whether `id` is currently flagged as inside brain tissue
    pub fn inside_brain(&self, id: &ManipulatorId) -> Option<bool> {
        self.manipulators.get(id).map(|m| m.inside_brain)
    }

    fn snapshot(&self, id: &ManipulatorId) -> Result<SimulatedManipulator> {
        self.manipulators
            .get(id)
            .map(|m| m.clone())
            .ok_or_else(|| not_registered(id))
    }
}

fn not_registered(id: &ManipulatorId) -> Error {
    Error::driver(format!("Manipulator {id} not registered"))
}

#[async_trait]
impl Driver for SimulatedDriver {
    async fn enumerate(&self) -> Result<Vec<ManipulatorInfo>> {
        let mut infos: Vec<_> = self.manipulators.iter().map(|m| m.info.clone()).collect();
        infos.sort_by(|a, b| a.manipulator_id.cmp(&b.manipulator_id));
        Ok(infos)
    }

    async fn position(&self, id: &ManipulatorId) -> Result<Vec<f64>> {
        Ok(self.snapshot(id)?.position)
    }

    async fn angles(&self, id: &ManipulatorId) -> Result<[f64; 3]> {
        Ok(self.snapshot(id)?.angles)
    }

    async fn shank_count(&self, id: &ManipulatorId) -> Result<u32> {
        Ok(self.snapshot(id)?.shank_count)
    }

    async fn move_to(&self, id: &ManipulatorId, target: &Target, speed: u32) -> Result<Movement> {
        let manipulator = self.snapshot(id)?;
        let mut position = manipulator.position.clone();

        match target {
            Target::Position(pos) => {
                if pos.len() > position.len() {
                    return Err(Error::driver(format!(
                        "Target has {} axes but manipulator {id} has {}",
                        pos.len(),
                        position.len()
                    )));
                }
                for (axis, value) in pos.iter().enumerate() {
                    manipulator.check_in_range(axis, *value)?;
                    position[axis] = *value;
                }
            }
            Target::Depth(depth) => {
                let axis = manipulator.depth_axis();
                manipulator.check_in_range(axis, *depth)?;
                if let Some(slot) = position.get_mut(axis) {
                    *slot = *depth;
                }
            }
        }
        debug!(manipulator_id = %id, ?target, speed, "simulated move started");

        if !self.move_latency.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(self.move_latency) => {}
                () = self.halt.notified() => {
                    return Err(Error::driver(format!("Manipulator {id} stopped")));
                }
            }
        }

        let mut entry = self.manipulators.get_mut(id).ok_or_else(|| not_registered(id))?;
        entry.position.clone_from(&position);

        Ok(match target {
            Target::Position(_) => Movement::Position(position),
            Target::Depth(depth) => Movement::Depth(*depth),
        })
    }

    async fn set_inside_brain(&self, id: &ManipulatorId, inside: bool) -> Result<bool> {
        let mut entry = self.manipulators.get_mut(id).ok_or_else(|| not_registered(id))?;
        entry.inside_brain = inside;
        Ok(inside)
    }

    async fn stop(&self) -> Result<()> {
        debug!("stopping all simulated manipulators");
        self.halt.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> SimulatedDriver {
        let driver = SimulatedDriver::new(Duration::ZERO);
        driver.add(ManipulatorInfo::new("1", 4, [20.0, 20.0, 20.0]), 1);
        driver.add(ManipulatorInfo::new("2", 3, [15.0, 15.0, 15.0]), 4);
        driver
    }

    #[tokio::test]
    async fn test_enumerate_sorted() {
        let infos = driver().enumerate().await.unwrap();
        let ids: Vec<_> = infos.iter().map(|i| i.manipulator_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(infos[1].num_axes, 3);
    }

    #[tokio::test]
    async fn test_move_and_depth() {
        let driver = driver();
        let id = ManipulatorId::from("1");

        let moved = driver
            .move_to(&id, &Target::Position(vec![1.0, 2.0, 3.0]), 10)
            .await
            .unwrap();
        assert_eq!(moved, Movement::Position(vec![1.0, 2.0, 3.0, 0.0]));

        let moved = driver.move_to(&id, &Target::Depth(5.5), 10).await.unwrap();
        assert_eq!(moved, Movement::Depth(5.5));
        assert_eq!(driver.position(&id).await.unwrap(), vec![1.0, 2.0, 3.0, 5.5]);
    }

    #[tokio::test]
    async fn test_three_axis_depth_moves_z() {
        let driver = driver();
        let id = ManipulatorId::from("2");

        driver.move_to(&id, &Target::Depth(7.0), 1).await.unwrap();
        assert_eq!(driver.position(&id).await.unwrap(), vec![0.0, 0.0, 7.0]);
        assert_eq!(driver.shank_count(&id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_out_of_range_leaves_position() {
        let driver = driver();
        let id = ManipulatorId::from("2");

        let err = driver
            .move_to(&id, &Target::Position(vec![1.0, 99.0, 1.0]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(_)));
        assert_eq!(driver.position(&id).await.unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_extra_axis_is_refused() {
        let driver = driver();
        let id = ManipulatorId::from("2");

        let err = driver
            .move_to(&id, &Target::Position(vec![1.0, 2.0, 3.0, 4.0]), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(_)));
        assert_eq!(err.to_string(), "Target has 4 axes but manipulator 2 has 3");
        assert_eq!(driver.position(&id).await.unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_unknown_manipulator() {
        let err = driver().angles(&"9".into()).await.unwrap_err();
        assert_eq!(err.to_string(), "Manipulator 9 not registered");
    }

    #[tokio::test]
    async fn test_inside_brain_flag() {
        let driver = driver();
        let id = ManipulatorId::from("1");

        assert_eq!(driver.inside_brain(&id), Some(false));
        assert!(driver.set_inside_brain(&id, true).await.unwrap());
        assert_eq!(driver.inside_brain(&id), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_move() {
        let driver = std::sync::Arc::new(SimulatedDriver::new(Duration::from_secs(10)));
        driver.add(ManipulatorInfo::new("1", 4, [20.0, 20.0, 20.0]), 1);

        let mover = {
            let driver = driver.clone();
            tokio::spawn(async move {
                driver
                    .move_to(&"1".into(), &Target::Position(vec![5.0, 5.0, 5.0]), 1)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        driver.stop().await.unwrap();

        let err = mover.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Manipulator 1 stopped");
        assert_eq!(driver.position(&"1".into()).await.unwrap(), vec![0.0; 4]);
    }
}
