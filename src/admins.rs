//! Admin accounts. There is no self-service registration; the bootstrap
//! account comes from configuration.

use rusqlite::Connection;
use thiserror::Error;

use crate::authorization::Credential;
use crate::crypto::{hash_password, CryptoError};
use crate::db::repository::{find_admin_by_username, insert_admin};
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { id: i64 },
    AlreadyPresent,
}

/// Create the admin account if `username` is not taken. An existing
/// account keeps its password.
pub fn provision(
    conn: &Connection,
    username: &str,
    password: &str,
    rounds: u32,
) -> Result<ProvisionOutcome, ProvisionError> {
    if find_admin_by_username(conn, username)?.is_some() {
        return Ok(ProvisionOutcome::AlreadyPresent);
    }
    let hash = hash_password(password, rounds)?;
    let id = insert_admin(conn, username, &hash)?;
    tracing::info!(admin_id = id, "Admin account provisioned");
    Ok(ProvisionOutcome::Created { id })
}

/// Login secret for `username`.
pub fn credential(conn: &Connection, username: &str) -> Result<Option<Credential>, DatabaseError> {
    Ok(find_admin_by_username(conn, username)?.map(|admin| Credential {
        subject: username.to_string(),
        password_hash: admin.password_hash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::{check_credentials, LoginOutcome};
    use crate::crypto::TokenService;
    use crate::db::sqlite::open_memory_database;

    fn login(conn: &Connection, username: &str, password: &str) -> LoginOutcome {
        let tokens = TokenService::new(b"test-secret-0123456789-abcdefghijklmnop", 60_000);
        let decoy = hash_password("decoy", 1_000).unwrap();
        let found = credential(conn, username).unwrap();
        check_credentials(&tokens, found.as_ref(), password, &decoy)
    }

    #[test]
    fn provision_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let first = provision(&conn, "root", "changeme", 1_000).unwrap();
        assert!(matches!(first, ProvisionOutcome::Created { .. }));
        let second = provision(&conn, "root", "different", 1_000).unwrap();
        assert_eq!(second, ProvisionOutcome::AlreadyPresent);

        assert!(matches!(login(&conn, "root", "changeme"), LoginOutcome::Token(_)));
        assert_eq!(login(&conn, "root", "different"), LoginOutcome::InvalidCredentials);
    }

    #[test]
    fn unknown_admin_rejected() {
        let conn = open_memory_database().unwrap();
        assert!(credential(&conn, "nobody").unwrap().is_none());
        assert_eq!(login(&conn, "nobody", "pw"), LoginOutcome::InvalidCredentials);
    }
}
