//! HTTP API.
//!
//! Routes are nested under `/api/`. Public routes carry no middleware;
//! each role group is wrapped in Auth → Audit before its handlers.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
