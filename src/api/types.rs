//! Shared types for the API layer.

use std::sync::Arc;

use crate::core_state::ClinicState;
use crate::models::Role;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<ClinicState>,
}

impl ApiContext {
    pub fn new(state: Arc<ClinicState>) -> Self {
        Self { state }
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware once the token's subject resolved in the route's role.
#[derive(Debug, Clone)]
pub struct Caller {
    pub role: Role,
    pub subject: String,
    /// Raw bearer token, forwarded to services that resolve the requester.
    pub token: String,
}
