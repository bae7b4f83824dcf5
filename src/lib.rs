pub mod admins;
pub mod api;
pub mod appointments;
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod doctors;
pub mod models;
pub mod patients;
pub mod prescriptions;
pub mod validation;
pub mod workflows;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::admins::{ProvisionError, ProvisionOutcome};
use crate::api::server::ServerError;
use crate::config::{ClinicConfig, ConfigError};
use crate::core_state::{ClinicState, CoreError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    State(#[from] CoreError),

    #[error("Admin bootstrap failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Signal handler failed: {0}")]
    Signal(std::io::Error),
}

/// Process entry point: logging, configuration, stores, admin bootstrap,
/// then serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Clinic scheduler starting v{}", config::APP_VERSION);

    let config = ClinicConfig::from_env()?;
    ensure_parent_dir(&config.clinic_db_path)?;
    ensure_parent_dir(&config.prescription_db_path)?;

    let state = Arc::new(ClinicState::open(config)?);
    bootstrap_admin(&state)?;
    // First unknown-account login should not pay for the decoy
    state.login_decoy();

    let mut server = api::start_api_server(state.clone(), state.config().bind_addr).await?;
    tracing::info!(addr = %server.addr(), "Listening");

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), StartupError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| StartupError::DataDir {
                path: dir.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn bootstrap_admin(state: &ClinicState) -> Result<(), StartupError> {
    let Some(admin) = state.config().admin.clone() else {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD unset; no admin account provisioned");
        return Ok(());
    };
    let conn = state.clinic_db()?;
    match admins::provision(&conn, &admin.username, &admin.password, state.password_rounds())? {
        ProvisionOutcome::Created { .. } => tracing::info!(username = %admin.username, "Bootstrap admin created"),
        ProvisionOutcome::AlreadyPresent => tracing::debug!("Bootstrap admin already present"),
    }
    Ok(())
}
