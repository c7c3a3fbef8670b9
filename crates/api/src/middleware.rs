//! Request extractors and per-request guards.

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
