use crate::extract::PluginRequest;
use crate::protocol::{
    CapabilitiesResponse, CreateRequest, GetResponse, ListResponse, MountRequest,
    MountpointResponse, NameRequest, VolumeInfo,
};
use crate::response::{no_error, PluginResponse};
use crate::{AppState, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::info;
use zfsvol_driver::VolumeDriver;

/// POST /VolumeDriver.Create
pub async fn create_volume(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<CreateRequest>,
) -> Result<Response> {
    info!("Creating volume: {}", req.name);

    state
        .driver
        .create(&req.name, req.opts.unwrap_or_default())
        .await?;

    Ok(no_error())
}

/// POST /VolumeDriver.List
pub async fn list_volumes(State(state): State<Arc<AppState>>) -> Result<Response> {
    let volumes = state.driver.list().await?;

    let response = ListResponse {
        volumes: volumes.into_iter().map(VolumeInfo::from).collect(),
        err: String::new(),
    };

    Ok(PluginResponse::ok(response).into_response())
}

/// POST /VolumeDriver.Get
pub async fn get_volume(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<NameRequest>,
) -> Result<Response> {
    let volume = state.driver.get(&req.name).await?;

    Ok(PluginResponse::ok(GetResponse {
        volume: volume.into(),
        err: String::new(),
    })
    .into_response())
}

/// POST /VolumeDriver.Remove
pub async fn remove_volume(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<NameRequest>,
) -> Result<Response> {
    info!("Removing volume: {}", req.name);

    state.driver.remove(&req.name).await?;

    Ok(no_error())
}

/// POST /VolumeDriver.Path
pub async fn volume_path(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<NameRequest>,
) -> Result<Response> {
    let mountpoint = state.driver.path(&req.name).await?;

    Ok(PluginResponse::ok(MountpointResponse {
        mountpoint,
        err: String::new(),
    })
    .into_response())
}

/// POST /VolumeDriver.Mount
pub async fn mount_volume(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<MountRequest>,
) -> Result<Response> {
    let mountpoint = state.driver.mount(&req.name, &req.id).await?;

    Ok(PluginResponse::ok(MountpointResponse {
        mountpoint,
        err: String::new(),
    })
    .into_response())
}

/// POST /VolumeDriver.Unmount
pub async fn unmount_volume(
    State(state): State<Arc<AppState>>,
    PluginRequest(req): PluginRequest<MountRequest>,
) -> Result<Response> {
    state.driver.unmount(&req.name, &req.id).await?;

    Ok(no_error())
}

/// POST /VolumeDriver.Capabilities
pub async fn capabilities(State(state): State<Arc<AppState>>) -> Response {
    PluginResponse::ok(CapabilitiesResponse::from(state.driver.capabilities())).into_response()
}
