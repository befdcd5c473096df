//! JSON handlers: the REST API and the mobile-app API.
//!
//! REST replies carry the registry as a key → device map plus an `order`
//! list, and use status codes for failures. Mobile replies always return
//! `200` with the ordered device list, free pins and device types; a
//! failed operation is reported in an extra `error` field, since the app
//! redraws from whatever it receives.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::app::commands::YardCommand;
use crate::app::events::DeviceView;
use crate::app::service::SwitchYard;
use crate::drivers::{DeviceKind, SwitchAction};
use crate::error::YardError;
use crate::pins::PinSet;

use super::{ApiError, AppState};

// ───────────────────────────────────────────────────────────────
// Reply shapes
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DevicesReply {
    pub order: Vec<String>,
    pub devices: BTreeMap<String, DeviceView>,
}

impl DevicesReply {
    fn of(yard: &SwitchYard) -> Self {
        let views = yard.snapshot();
        Self {
            order: views.iter().map(|v| v.key.clone()).collect(),
            devices: views.into_iter().map(|v| (v.key.clone(), v)).collect(),
        }
    }

    /// Reply holding just one device, keyed like the full listing.
    fn single(view: DeviceView) -> Self {
        Self {
            order: vec![view.key.clone()],
            devices: BTreeMap::from([(view.key.clone(), view)]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MobileReply {
    pub devices: Vec<DeviceView>,
    pub pin_pool: Vec<u8>,
    pub device_types: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MobileReply {
    fn of(yard: &SwitchYard, error: Option<String>) -> Self {
        Self {
            devices: yard.snapshot(),
            pin_pool: yard.pool(),
            device_types: yard.device_types(),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutsReply {
    pub layouts: Vec<String>,
}

// ───────────────────────────────────────────────────────────────
// REST
// ───────────────────────────────────────────────────────────────

pub async fn list_devices(State(state): State<AppState>) -> Result<Json<DevicesReply>, ApiError> {
    Ok(Json(state.run(|yard| DevicesReply::of(yard)).await?))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(pins): Path<String>,
) -> Result<Json<DevicesReply>, ApiError> {
    let pins = PinSet::parse(&pins).map_err(YardError::from)?;
    let key = pins.key();
    let view = state.run(move |yard| yard.device(&pins)).await?;
    view.map(|v| Json(DevicesReply::single(v)))
        .ok_or_else(|| ApiError::Yard(YardError::NoSuchDevice(key)))
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(pins): Path<String>,
) -> Result<Json<DevicesReply>, ApiError> {
    let pins = PinSet::parse(&pins).map_err(YardError::from)?;
    let reply = state
        .run(move |yard| {
            if yard.remove(&pins)? {
                Ok(DevicesReply::of(yard))
            } else {
                Err(YardError::NoSuchDevice(pins.key()))
            }
        })
        .await?;
    Ok(Json(reply?))
}

/// `POST /devices/{pins}/{type}`: add a device.
pub async fn post_device(
    State(state): State<AppState>,
    Path((pins, kind)): Path<(String, String)>,
) -> Result<Json<DevicesReply>, ApiError> {
    let cmd = add_command(&pins, &kind)?;
    rest_command(&state, cmd).await
}

/// `PUT /devices/{pins}/{action}`: throw a switch.
pub async fn put_device(
    State(state): State<AppState>,
    Path((pins, action)): Path<(String, String)>,
) -> Result<Json<DevicesReply>, ApiError> {
    let pins = PinSet::parse(&pins).map_err(YardError::from)?;
    let action = SwitchAction::parse(&action).map_err(YardError::from)?;
    rest_command(&state, YardCommand::Act { pins, action }).await
}

async fn rest_command(state: &AppState, cmd: YardCommand) -> Result<Json<DevicesReply>, ApiError> {
    let reply = state
        .run(move |yard| {
            yard.handle_command(cmd)?;
            Ok::<_, YardError>(DevicesReply::of(yard))
        })
        .await?;
    Ok(Json(reply?))
}

fn add_command(pins: &str, kind: &str) -> Result<YardCommand, YardError> {
    Ok(YardCommand::Add {
        pins: PinSet::parse(pins)?,
        kind: DeviceKind::parse(kind)?,
    })
}

// ───────────────────────────────────────────────────────────────
// Mobile app
// ───────────────────────────────────────────────────────────────

/// Run a parsed command (or report the parse failure) and reply with the
/// full snapshot either way.
async fn mobile_command(
    state: &AppState,
    cmd: Result<YardCommand, YardError>,
) -> Result<Json<MobileReply>, ApiError> {
    let reply = state
        .run(move |yard| {
            let error = cmd
                .and_then(|cmd| yard.handle_command(cmd))
                .err()
                .map(|e| {
                    log::warn!("mobile request failed: {}", e);
                    e.to_string()
                });
            MobileReply::of(yard, error)
        })
        .await?;
    Ok(Json(reply))
}

pub async fn mobile_get(State(state): State<AppState>) -> Result<Json<MobileReply>, ApiError> {
    Ok(Json(state.run(|yard| MobileReply::of(yard, None)).await?))
}

pub async fn mobile_layouts(State(state): State<AppState>) -> Result<Json<LayoutsReply>, ApiError> {
    let layouts = state.run(|yard| yard.list_layouts()).await??;
    Ok(Json(LayoutsReply { layouts }))
}

pub async fn mobile_save(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::SaveLayout(name))).await
}

pub async fn mobile_load(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::LoadLayout(name))).await
}

pub async fn mobile_remove_layout(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::DeleteLayout(name))).await
}

/// Positions are 1-based as shown in the app.
pub async fn mobile_toggle_index(
    State(state): State<AppState>,
    Path(device): Path<usize>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::ToggleIndex(device))).await
}

pub async fn mobile_reset_index(
    State(state): State<AppState>,
    Path(device): Path<usize>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::ResetIndex(device))).await
}

pub async fn mobile_toggle_pins(
    State(state): State<AppState>,
    Path(pins): Path<String>,
) -> Result<Json<MobileReply>, ApiError> {
    let cmd = PinSet::parse(&pins)
        .map(YardCommand::Toggle)
        .map_err(YardError::from);
    mobile_command(&state, cmd).await
}

pub async fn mobile_delete(
    State(state): State<AppState>,
    Path(pins): Path<String>,
) -> Result<Json<MobileReply>, ApiError> {
    let cmd = PinSet::parse(&pins)
        .map(YardCommand::Remove)
        .map_err(YardError::from);
    mobile_command(&state, cmd).await
}

pub async fn mobile_post(
    State(state): State<AppState>,
    Path((pins, kind)): Path<(String, String)>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, add_command(&pins, &kind)).await
}

/// Positions are 0-based; `finish` is a drop slot in `0..=len`.
pub async fn mobile_shuffle(
    State(state): State<AppState>,
    Path((start, finish)): Path<(usize, usize)>,
) -> Result<Json<MobileReply>, ApiError> {
    mobile_command(&state, Ok(YardCommand::Move { start, finish })).await
}
