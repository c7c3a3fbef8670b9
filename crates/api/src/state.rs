use std::sync::Arc;

use crate::{
    clock::Clock,
    config::Config,
    repos::Repos,
    services::{AuthService, FileStorage},
    stores::Stores,
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Database repositories.
    pub repos: Repos,
    /// Ephemeral stores (rate limits).
    pub stores: Stores,
    /// Password and token service.
    pub auth: Arc<dyn AuthService>,
    /// Uploaded file storage.
    pub files: Arc<dyn FileStorage>,
    /// Time source for rate-limit headers.
    pub clock: Arc<dyn Clock>,
}
