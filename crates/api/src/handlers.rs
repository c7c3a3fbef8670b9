//! HTTP handlers, one module per route group. Each exposes a `router()` that
//! `main` nests under its prefix.

pub mod admin;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod downloads;
pub mod health;
pub mod uploads;
