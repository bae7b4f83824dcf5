//! Role authorization for bearer tokens.
//!
//! A token grants a role when its subject resolves in that role's directory:
//! admins by username, doctors and patients by email. Any failure denies.

use rusqlite::Connection;

use crate::crypto::{verify_password, TokenService};
use crate::db::repository::{doctor_email_exists, find_admin_by_username, find_patient_by_email};
use crate::db::DatabaseError;
use crate::models::Role;

// ═══════════════════════════════════════════════════════════
// Directory lookup
// ═══════════════════════════════════════════════════════════

/// Answers "does this subject exist in the role's directory".
pub trait RoleResolver {
    fn admin_exists(&self, username: &str) -> Result<bool, DatabaseError>;
    fn doctor_exists(&self, email: &str) -> Result<bool, DatabaseError>;
    fn patient_exists(&self, email: &str) -> Result<bool, DatabaseError>;

    fn subject_has_role(&self, subject: &str, role: Role) -> Result<bool, DatabaseError> {
        match role {
            Role::Admin => self.admin_exists(subject),
            Role::Doctor => self.doctor_exists(subject),
            Role::Patient => self.patient_exists(subject),
        }
    }
}

/// Resolver backed by the clinic store.
pub struct DirectoryResolver<'a> {
    conn: &'a Connection,
}

impl<'a> DirectoryResolver<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RoleResolver for DirectoryResolver<'_> {
    fn admin_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        Ok(find_admin_by_username(self.conn, username)?.is_some())
    }

    fn doctor_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        doctor_email_exists(self.conn, email)
    }

    fn patient_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        Ok(find_patient_by_email(self.conn, email)?.is_some())
    }
}

// ═══════════════════════════════════════════════════════════
// Token check
// ═══════════════════════════════════════════════════════════

/// True when `token` is valid and its subject holds `role_label`
/// (`admin`, `doctor` or `patient`, any case). Unknown labels deny.
pub fn validate_token(
    tokens: &TokenService,
    resolver: &impl RoleResolver,
    token: &str,
    role_label: &str,
) -> bool {
    let Some(role) = Role::parse_label(role_label) else {
        return false;
    };
    match tokens.extract_subject(token) {
        Some(subject) => has_role(resolver, &subject, role),
        None => false,
    }
}

/// Subject-level check, for callers that already decoded the token.
pub fn has_role(resolver: &impl RoleResolver, subject: &str, role: Role) -> bool {
    match resolver.subject_has_role(subject, role) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(role = role.as_str(), error = %e, "Role lookup failed; denying");
            false
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Credential login
// ═══════════════════════════════════════════════════════════

/// Result of a username/email + password login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Token(String),
    InvalidCredentials,
    Failed,
}

/// Stored secret of one account, read under the store lock and verified
/// after it is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Token subject issued on a match.
    pub subject: String,
    pub password_hash: String,
}

/// Verify `password` against `credential` and issue a token on match.
///
/// Unknown accounts are verified against `decoy_hash` so they cost the
/// same as a wrong password.
pub fn check_credentials(
    tokens: &TokenService,
    credential: Option<&Credential>,
    password: &str,
    decoy_hash: &str,
) -> LoginOutcome {
    let Some(credential) = credential else {
        let _ = verify_password(password, decoy_hash);
        tracing::warn!("Login rejected: unknown account");
        return LoginOutcome::InvalidCredentials;
    };
    match verify_password(password, &credential.password_hash) {
        Ok(true) => match tokens.issue(&credential.subject) {
            Ok(token) => LoginOutcome::Token(token),
            Err(e) => {
                tracing::error!(error = %e, "Token issuing failed");
                LoginOutcome::Failed
            }
        },
        Ok(false) => {
            tracing::warn!("Login rejected: wrong password");
            LoginOutcome::InvalidCredentials
        }
        Err(e) => {
            tracing::error!(error = %e, "Stored credential unreadable");
            LoginOutcome::Failed
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
