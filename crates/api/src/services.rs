//! Service abstractions.
//!
//! Each service is abstracted behind a trait to enable mocking in tests.
//!
//! ## Services
//!
//! - **auth** - Password hashing (Argon2id) and bearer tokens (HS256 JWT)
//! - **storage** - Uploaded file persistence on the local filesystem
//!
//! ## Usage in Handlers
//!
//! Services are accessed via `AppState`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let claims = state.auth.verify_token(token)?;
//!     let url = state.files.save(&name, bytes).await?;
//! }
//! ```

mod auth;
mod storage;

pub use auth::{AuthService, Claims, DUMMY_PASSWORD_HASH, IssuedToken, JwtAuthService};
pub use storage::{FileLocation, FileStorage, LocalFileStorage};

#[cfg(test)]
pub use auth::MockAuthService;
#[cfg(test)]
pub use storage::MockFileStorage;
