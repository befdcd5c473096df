//! HTTP front end.
//!
//! Three surfaces share one registry:
//!
//! - HTML pages for a browser on the LAN (`/`, `/config/`, `/pinout/`, ...)
//! - a REST API under `/devices/...` using proper verbs and status codes
//! - the Rail Yard mobile app API, all `GET`, always answering with the
//!   full registry snapshot
//!
//! Every registry access runs on the blocking pool behind one mutex:
//! relay throws sleep while a coil is energised, and hardware writes must
//! never interleave.

pub mod api;
pub mod pages;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;

use crate::app::ports::LayoutError;
use crate::app::service::SwitchYard;
use crate::error::{SwitchError, YardError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    yard: Arc<Mutex<SwitchYard>>,
    log_path: PathBuf,
    port: u16,
}

impl AppState {
    pub fn new(yard: Arc<Mutex<SwitchYard>>, log_path: PathBuf, port: u16) -> Self {
        Self {
            yard,
            log_path,
            port,
        }
    }

    /// Run `f` against the registry on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut SwitchYard) -> T + Send + 'static,
        T: Send + 'static,
    {
        let yard = Arc::clone(&self.yard);
        tokio::task::spawn_blocking(move || {
            let mut guard = yard.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("registry task failed: {e}")))
    }

    pub fn log_path(&self) -> &PathBuf {
        &self.log_path
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Build the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        // ── HTML ──────────────────────────────────────────────
        .route("/", get(pages::index).post(pages::index_submit))
        .route("/log/", get(pages::log))
        .route("/ip/", get(pages::ip))
        .route("/ip/json/", get(pages::ip_json))
        .route("/pinout/", get(pages::pinout))
        .route("/config/", get(pages::config))
        .route("/config/load", post(pages::config_add))
        .route("/config/delete/:pins", post(pages::config_delete))
        .route("/config/shuffle/:pins/:direction", post(pages::config_shuffle))
        .route("/save/", get(pages::save_default))
        .route("/load/", get(pages::load_default))
        // ── REST ──────────────────────────────────────────────
        .route("/devices/", get(api::list_devices))
        .route(
            "/devices/:pins",
            get(api::get_device).delete(api::delete_device),
        )
        .route(
            "/devices/:pins/:arg",
            post(api::post_device).put(api::put_device),
        )
        // ── Mobile app ────────────────────────────────────────
        .route("/devices/get", get(api::mobile_get))
        .route("/devices/layouts", get(api::mobile_layouts))
        .route("/devices/save/:name", get(api::mobile_save))
        .route("/devices/load/:name", get(api::mobile_load))
        .route("/devices/remove/:name", get(api::mobile_remove_layout))
        .route("/devices/toggle/:device", get(api::mobile_toggle_index))
        .route("/devices/toggle/pins/:pins", get(api::mobile_toggle_pins))
        .route("/devices/reset/:device", get(api::mobile_reset_index))
        .route("/devices/delete/:pins", get(api::mobile_delete))
        .route("/devices/post/:pins/:device_type", get(api::mobile_post))
        .route("/devices/shuffle/:start/:finish", get(api::mobile_shuffle))
        .with_state(state)
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

/// Error rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    Yard(YardError),
    Internal(String),
}

impl From<YardError> for ApiError {
    fn from(e: YardError) -> Self {
        Self::Yard(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Yard(e) => yard_status(e),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Yard(e) => e.to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

fn yard_status(e: &YardError) -> StatusCode {
    match e {
        YardError::Pin(_) | YardError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
        YardError::Switch(SwitchError::Line(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        YardError::Switch(_) => StatusCode::BAD_REQUEST,
        YardError::Layout(LayoutError::NotFound(_)) | YardError::NoSuchDevice(_) => {
            StatusCode::NOT_FOUND
        }
        YardError::Layout(LayoutError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        YardError::Layout(_) => StatusCode::BAD_REQUEST,
        YardError::PinUnavailable(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(msg) = &self {
            log::error!("request failed: {}", msg);
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
