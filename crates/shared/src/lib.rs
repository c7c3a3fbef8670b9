//! Wire types shared between the storefront API server and its clients.

pub mod api;
