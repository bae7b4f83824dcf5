use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "ClinicScheduler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default token lifetime: 7 days, in milliseconds.
pub const DEFAULT_TOKEN_LIFETIME_MS: i64 = 604_800_000;

/// PBKDF2 rounds for stored password hashes.
pub const DEFAULT_PASSWORD_ROUNDS: u32 = 600_000;

/// HMAC-SHA256 keys shorter than this are rejected at startup.
pub const MIN_SECRET_LENGTH: usize = 32;

const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be at least 32 bytes")]
    SecretTooShort,

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Bootstrap admin account, created at startup if missing.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

/// Runtime configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub bind_addr: SocketAddr,
    pub clinic_db_path: PathBuf,
    pub prescription_db_path: PathBuf,
    pub jwt_secret: String,
    pub token_lifetime_ms: i64,
    pub password_rounds: u32,
    pub admin: Option<AdminBootstrap>,
}

impl ClinicConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let ip: IpAddr = parse_var("BIND_ADDR")?.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port: u16 = parse_var("PORT")?.unwrap_or(DEFAULT_PORT);

        let clinic_db_path = match env::var("CLINIC_DB_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => app_data_dir()?.join("clinic.db"),
        };
        let prescription_db_path = match env::var("PRESCRIPTION_DB_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => app_data_dir()?.join("prescriptions.db"),
        };

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort);
        }

        let token_lifetime_ms = parse_var("JWT_EXPIRATION_MS")?.unwrap_or(DEFAULT_TOKEN_LIFETIME_MS);
        let password_rounds = parse_var("PASSWORD_HASH_ROUNDS")?.unwrap_or(DEFAULT_PASSWORD_ROUNDS);

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(AdminBootstrap { username, password }),
            _ => None,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            clinic_db_path,
            prescription_db_path,
            jwt_secret,
            token_lifetime_ms,
            password_rounds,
            admin,
        })
    }

    /// Configuration for in-memory test instances.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            clinic_db_path: PathBuf::from(":memory:"),
            prescription_db_path: PathBuf::from(":memory:"),
            jwt_secret: "test-secret-0123456789-abcdefghijklmnop".into(),
            token_lifetime_ms: DEFAULT_TOKEN_LIFETIME_MS,
            password_rounds: 1_000,
            admin: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}

/// Get the application data directory
/// ~/ClinicScheduler/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinic_scheduler=info,tower_http=warn"
}
