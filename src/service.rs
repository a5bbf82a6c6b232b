// Link service - every client-facing operation, answered with an output record

use crate::driver::Driver;
use crate::gate::CommandGate;
use crate::leases::LeaseManager;
use crate::message::{
    CanWriteInput, DriveToDepthInput, GotoPositionInput, InsideBrainInput, Movement,
    MovementRequest, PermissionChange,
};
use crate::response::{
    AnglesOutput, DepthOutput, ManipulatorsOutput, PositionOutput, ShankCountOutput, StateOutput,
};
use crate::{Error, ManipulatorId, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Wires leases, the command gate and the driver together
///
/// No operation here returns an error: failures become the `error` field of
/// the matching output record.
#[derive(Debug, Clone)]
pub struct Link {
    leases: Arc<LeaseManager>,
    gate: CommandGate,
    driver: Arc<dyn Driver>,
}

impl Link {
    pub fn new(leases: Arc<LeaseManager>, driver: Arc<dyn Driver>) -> Self {
        Self {
            gate: CommandGate::new(leases.clone(), driver.clone()),
            leases,
            driver,
        }
    }

    pub fn leases(&self) -> &Arc<LeaseManager> {
        &self.leases
    }

    pub async fn get_manipulators(&self) -> ManipulatorsOutput {
        match self.driver.enumerate().await {
            Ok(infos) => ManipulatorsOutput::ok(&infos),
            Err(e) => failed(&e, ManipulatorsOutput::failed),
        }
    }

    pub async fn get_pos(&self, id: &ManipulatorId) -> PositionOutput {
        match self.driver.position(id).await {
            Ok(position) => PositionOutput::ok(position),
            Err(e) => failed(&e, PositionOutput::failed),
        }
    }

    pub async fn get_angles(&self, id: &ManipulatorId) -> AnglesOutput {
        match self.driver.angles(id).await {
            Ok(angles) => AnglesOutput::ok(angles),
            Err(e) => failed(&e, AnglesOutput::failed),
        }
    }

    pub async fn get_shank_count(&self, id: &ManipulatorId) -> ShankCountOutput {
        match self.driver.shank_count(id).await {
            Ok(count) => ShankCountOutput::ok(count),
            Err(e) => failed(&e, ShankCountOutput::failed),
        }
    }

    pub async fn goto_pos(&self, input: GotoPositionInput) -> PositionOutput {
        match self.submit(MovementRequest::try_from(input)).await {
            Ok(Movement::Position(position)) => PositionOutput::ok(position),
            Ok(other) => failed(&unexpected(&other), PositionOutput::failed),
            Err(e) => failed(&e, PositionOutput::failed),
        }
    }

    pub async fn drive_to_depth(&self, input: DriveToDepthInput) -> DepthOutput {
        match self.submit(MovementRequest::try_from(input)).await {
            Ok(Movement::Depth(depth)) => DepthOutput::ok(depth),
            Ok(other) => failed(&unexpected(&other), DepthOutput::failed),
            Err(e) => failed(&e, DepthOutput::failed),
        }
    }

    /// Record tissue contact; not gated by the write lease
    pub async fn set_inside_brain(&self, input: InsideBrainInput) -> StateOutput {
        match self
            .driver
            .set_inside_brain(&input.manipulator_id, input.inside)
            .await
        {
            Ok(state) => StateOutput::ok(state),
            Err(e) => failed(&e, StateOutput::failed),
        }
    }

    /// Grant or revoke write permission; `state` reports writability afterwards
    pub fn set_can_write(&self, input: CanWriteInput) -> StateOutput {
        let result = PermissionChange::try_from(input).and_then(|change| match change {
            PermissionChange::Grant { manipulator_id, hours } => self
                .leases
                .grant(&manipulator_id, hours)
                .map(|_| self.leases.is_writable(&manipulator_id)),
            PermissionChange::Revoke { manipulator_id } => {
                Ok(self.leases.revoke(&manipulator_id).granted())
            }
        });
        match result {
            Ok(state) => StateOutput::ok(state),
            Err(e) => failed(&e, StateOutput::failed),
        }
    }

    /// Halt every manipulator; never gated
    pub async fn stop(&self) -> StateOutput {
        match self.driver.stop().await {
            Ok(()) => StateOutput::ok(true),
            Err(e) => failed(&e, StateOutput::failed),
        }
    }

    async fn submit(&self, request: Result<MovementRequest>) -> Result<Movement> {
        self.gate.submit(&request?).await
    }
}

fn unexpected(movement: &Movement) -> Error {
    Error::driver(format!("Driver reported {movement:?} for a different kind of move"))
}

fn failed<T>(error: &Error, output: impl FnOnce(&Error) -> T) -> T {
    match error {
        Error::PermissionDenied { .. } | Error::InvalidArgument(_) => debug!(%error, "request rejected"),
        _ => warn!(%error, "request failed"),
    }
    output(error)
}
