// HTTP transport for the link
//
// Every route answers 200 with one of the fixed output records; failures,
// including unparseable bodies, travel in the record's `error` field.

use crate::config::LinkConfig;
use crate::driver::SimulatedDriver;
use crate::leases::LeaseManager;
use crate::message::{CanWriteInput, DriveToDepthInput, GotoPositionInput, InsideBrainInput};
use crate::response::{
    AnglesOutput, DepthOutput, ManipulatorsOutput, PositionOutput, ShankCountOutput, StateOutput,
};
use crate::service::Link;
use crate::time::MonotonicClock;
use crate::{Error, ManipulatorId, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub fn router(link: Link) -> Router {
    Router::new()
        .route("/manipulators", get(get_manipulators))
        .route("/manipulators/:id/position", get(get_pos))
        .route("/manipulators/:id/angles", get(get_angles))
        .route("/manipulators/:id/shank_count", get(get_shank_count))
        .route("/goto_pos", post(goto_pos))
        .route("/drive_to_depth", post(drive_to_depth))
        .route("/inside_brain", post(set_inside_brain))
        .route("/can_write", post(set_can_write))
        .route("/stop", post(stop))
        .layer(TraceLayer::new_for_http())
        .with_state(link)
}

fn rejected(rejection: &JsonRejection) -> Error {
    Error::invalid(rejection.body_text())
}

async fn get_manipulators(State(link): State<Link>) -> Json<ManipulatorsOutput> {
    Json(link.get_manipulators().await)
}

async fn get_pos(State(link): State<Link>, Path(id): Path<String>) -> Json<PositionOutput> {
    Json(link.get_pos(&ManipulatorId::from(id)).await)
}

async fn get_angles(State(link): State<Link>, Path(id): Path<String>) -> Json<AnglesOutput> {
    Json(link.get_angles(&ManipulatorId::from(id)).await)
}

async fn get_shank_count(
    State(link): State<Link>,
    Path(id): Path<String>,
) -> Json<ShankCountOutput> {
    Json(link.get_shank_count(&ManipulatorId::from(id)).await)
}

async fn goto_pos(
    State(link): State<Link>,
    body: std::result::Result<Json<GotoPositionInput>, JsonRejection>,
) -> Json<PositionOutput> {
    match body {
        Ok(Json(input)) => Json(link.goto_pos(input).await),
        Err(rejection) => Json(PositionOutput::failed(&rejected(&rejection))),
    }
}

async fn drive_to_depth(
    State(link): State<Link>,
    body: std::result::Result<Json<DriveToDepthInput>, JsonRejection>,
) -> Json<DepthOutput> {
    match body {
        Ok(Json(input)) => Json(link.drive_to_depth(input).await),
        Err(rejection) => Json(DepthOutput::failed(&rejected(&rejection))),
    }
}

async fn set_inside_brain(
    State(link): State<Link>,
    body: std::result::Result<Json<InsideBrainInput>, JsonRejection>,
) -> Json<StateOutput> {
    match body {
        Ok(Json(input)) => Json(link.set_inside_brain(input).await),
        Err(rejection) => Json(StateOutput::failed(&rejected(&rejection))),
    }
}

async fn set_can_write(
    State(link): State<Link>,
    body: std::result::Result<Json<CanWriteInput>, JsonRejection>,
) -> Json<StateOutput> {
    match body {
        Ok(Json(input)) => Json(link.set_can_write(input)),
        Err(rejection) => Json(StateOutput::failed(&rejected(&rejection))),
    }
}

async fn stop(State(link): State<Link>) -> Json<StateOutput> {
    Json(link.stop().await)
}

/// Serve `link` on `addr` until ctrl-c
pub async fn serve(addr: SocketAddr, link: Link) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("Failed to bind {addr}: {e}")))?;
    info!("ephys-link listening on {}", listener.local_addr()?);

    axum::serve(listener, router(link))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Build a link over the simulated driver and serve it
///
/// All manipulators are stopped once the server exits.
pub async fn run(config: LinkConfig) -> Result<()> {
    let leases = Arc::new(LeaseManager::new(Arc::new(MonotonicClock)));
    let reaper = config
        .reap_interval
        .map(|interval| leases.spawn_reaper(interval));

    let driver = Arc::new(SimulatedDriver::from_config(&config.simulated));
    info!(
        manipulators = config.simulated.manipulators,
        num_axes = config.simulated.num_axes,
        "simulated platform ready"
    );

    let link = Link::new(leases, driver);
    let served = serve(config.bind_addr, link.clone()).await;

    let stopped = link.stop().await;
    if !stopped.error.is_empty() {
        error!("Failed to stop manipulators: {}", stopped.error);
    }
    if let Some(reaper) = reaper {
        reaper.abort();
    }
    served
}
