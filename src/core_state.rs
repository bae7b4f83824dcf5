//! Shared application state for the HTTP layer.
//!
//! One `ClinicState` is built at startup and shared behind an `Arc`. The
//! token service is read-only; each store sits behind its own mutex, held
//! for the duration of one service call and never across an `.await`.
//!
//! Lock order when both stores are needed: clinic store, then
//! prescription store.

use std::sync::{Mutex, MutexGuard, OnceLock};

use rusqlite::Connection;

use crate::config::ClinicConfig;
use crate::crypto::{hash_password, TokenService};
use crate::db;
use crate::db::prescription_db::open_prescription_database;

// ═══════════════════════════════════════════════════════════
// ClinicState
// ═══════════════════════════════════════════════════════════

pub struct ClinicState {
    config: ClinicConfig,
    tokens: TokenService,
    /// Doctors, patients, admins and appointments.
    clinic_db: Mutex<Connection>,
    /// Prescription documents.
    prescription_db: Mutex<Connection>,
    /// Hash verified for logins naming no account.
    login_decoy: OnceLock<String>,
}

impl ClinicState {
    /// Open (and migrate) both stores at the configured paths.
    pub fn open(config: ClinicConfig) -> Result<Self, CoreError> {
        let clinic = db::open_database(&config.clinic_db_path)?;
        let prescriptions = open_prescription_database(&config.prescription_db_path)?;
        Ok(Self::from_connections(config, clinic, prescriptions))
    }

    /// Wrap already-open connections. Both must be migrated.
    pub fn from_connections(config: ClinicConfig, clinic: Connection, prescriptions: Connection) -> Self {
        let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.token_lifetime_ms);
        Self {
            config,
            tokens,
            clinic_db: Mutex::new(clinic),
            prescription_db: Mutex::new(prescriptions),
            login_decoy: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// PBKDF2 rounds for newly stored passwords.
    pub fn password_rounds(&self) -> u32 {
        self.config.password_rounds
    }

    /// PHC hash at the configured rounds, made on first use. Logins for
    /// unknown accounts verify against it. Blocks for one hash; call off
    /// the async executor.
    pub fn login_decoy(&self) -> &str {
        self.login_decoy.get_or_init(|| {
            hash_password("clinic-scheduler-decoy", self.config.password_rounds).unwrap_or_else(|e| {
                // An empty hash fails to parse; unknown logins still deny
                tracing::error!(error = %e, "Decoy hash unavailable");
                String::new()
            })
        })
    }

    pub fn clinic_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.clinic_db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn prescription_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.prescription_db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Fresh in-memory state for tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let clinic = db::open_memory_database().expect("in-memory clinic store");
        let prescriptions = db::prescription_db::open_memory_prescription_database()
            .expect("in-memory prescription store");
        Self::from_connections(ClinicConfig::for_tests(), clinic, prescriptions)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_state_has_migrated_stores() {
        let state = ClinicState::in_memory();
        let clinic = state.clinic_db().unwrap();
        assert_eq!(db::count_tables(&clinic).unwrap(), 6);
        let prescriptions = state.prescription_db().unwrap();
        assert_eq!(db::count_tables(&prescriptions).unwrap(), 2);
    }

    #[test]
    fn tokens_use_configured_secret() {
        let state = ClinicState::in_memory();
        let token = state.tokens().issue("root").unwrap();
        let same_key = TokenService::new(state.config().jwt_secret.as_bytes(), 60_000);
        assert_eq!(same_key.extract_subject(&token).as_deref(), Some("root"));
    }

    #[test]
    fn login_decoy_uses_configured_rounds() {
        let state = ClinicState::in_memory();
        let decoy = state.login_decoy().to_string();
        assert!(decoy.starts_with("$pbkdf2-sha256$i=1000,"), "{decoy}");
        assert_eq!(state.login_decoy(), decoy);
    }

    #[test]
    fn open_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClinicConfig::for_tests();
        config.clinic_db_path = dir.path().join("clinic.db");
        config.prescription_db_path = dir.path().join("prescriptions.db");

        let state = ClinicState::open(config).unwrap();
        assert!(state.config().clinic_db_path.exists());
        assert!(state.config().prescription_db_path.exists());
    }

    #[test]
    fn state_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClinicState>();
    }
}
