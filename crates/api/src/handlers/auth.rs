//! Credential login and current-user endpoints.
//!
//! ## Endpoints
//!
//! - POST /auth/login - Exchange email + password for a bearer token
//! - GET /auth/me - The signed-in user
//!
//! Login attempts are throttled per client IP (`login:{ip}`) before the
//! credentials are looked at, so failed and successful attempts count alike.

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use shared::api::{LoginPayload, LoginResponse, MeResponse};

use crate::{
    error::AppError,
    middleware::{
        auth::AuthUser,
        client_ip::ClientIp,
        rate_limit::{scopes, throttle},
    },
    services::DUMMY_PASSWORD_HASH,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(get_me))
}

#[debug_handler]
async fn login(
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    throttle(&state, scopes::LOGIN, &ip, state.config.login_policy()).await?;

    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let Some(user) = state.repos.users.find_by_email(&payload.email).await? else {
        // Same hashing cost as a wrong password.
        let _ = state
            .auth
            .verify_password(&payload.password, DUMMY_PASSWORD_HASH)
            .await;
        tracing::info!(ip = %ip, "Login for unknown email");
        return Err(AppError::External(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    };

    if !state
        .auth
        .verify_password(&payload.password, &user.password_hash)
        .await?
    {
        tracing::info!(user_id = %user.id, ip = %ip, "Login with wrong password");
        return Err(AppError::External(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    let issued = state.auth.issue_token(&user)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        role: user.role,
        expires_at: issued.expires_at,
    }))
}

#[debug_handler]
async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .repos
        .users
        .find_by_id(user.id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "User not found"))?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        role: user.role,
    }))
}
