//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer token + role lookup, injects `Caller`
//! 2. Audit logger: logs after auth, has the caller's subject

pub mod audit;
pub mod auth;
