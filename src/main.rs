//! Railyard: Main Entry Point
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                    │
//! │                                                           │
//! │  RpiGpio / SimGpio   FileLayoutStore   LogEventSink       │
//! │  (GpioPort)          (LayoutStore)     (EventSink)        │
//! │                                                           │
//! │  ─────────────── Port Trait Boundary ────────────────     │
//! │                                                           │
//! │  ┌─────────────────────────────────────────────────┐      │
//! │  │            SwitchYard (registry logic)          │      │
//! │  └─────────────────────────────────────────────────┘      │
//! │                                                           │
//! │  axum router: HTML pages · REST · mobile app API          │
//! └───────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use log::{info, warn};

use railyard::adapters::layout_files::FileLayoutStore;
use railyard::adapters::log_file;
use railyard::adapters::log_sink::LogEventSink;
use railyard::app::layout::DEFAULT_LAYOUT;
use railyard::app::ports::LayoutError;
use railyard::app::service::SwitchYard;
use railyard::config::ServerConfig;
use railyard::error::YardError;
use railyard::http::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Configuration ──────────────────────────────────────
    let config = ServerConfig::from_env()?;
    config.check_working_directory()?;

    // ── 2. Logging ────────────────────────────────────────────
    log_file::init(&config.log_file)?;
    info!("Railyard v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 3. Registry ───────────────────────────────────────────
    let gpio = railyard::adapters::default_gpio().context("opening GPIO")?;
    let store = FileLayoutStore::open(&config.layouts_dir).context("opening layouts directory")?;
    let mut yard = SwitchYard::new(
        gpio,
        Box::new(store),
        Box::new(LogEventSink::new()),
        config.switches.clone(),
    );

    if config.autoload {
        match yard.load_layout(DEFAULT_LAYOUT) {
            Ok(n) => info!("autoloaded {} device(s)", n),
            Err(YardError::Layout(LayoutError::NotFound(_))) => {
                info!("no saved layout, starting empty");
            }
            Err(e) => warn!("autoload failed: {}", e),
        }
    }
    let yard = Arc::new(Mutex::new(yard));

    // ── 4. HTTP ───────────────────────────────────────────────
    let state = AppState::new(Arc::clone(&yard), config.log_file.clone(), config.port);
    let app = http::router(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving HTTP")?;

    // ── 5. Park hardware ──────────────────────────────────────
    let closed = yard
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .shutdown();
    info!("stopped, {} device(s) closed", closed);
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM (service stop).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler failed: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown requested");
}
