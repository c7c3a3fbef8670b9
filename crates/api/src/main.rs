mod catalog;
mod clock;
mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod repos;
mod services;
mod state;
mod stores;
#[cfg(test)]
mod test_utils;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result, bail};
use axum::{Router, extract::DefaultBodyLimit, http};
use clap::Parser;
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    clock::{Clock, SystemClock},
    config::{Config, RateLimitBackend},
    models::Role,
    repos::{PgAssetRepo, PgAuditRepo, PgProductRepo, PgStatusRepo, PgUserRepo, Repos, UserRepo},
    services::{AuthService, JwtAuthService, LocalFileStorage},
    state::AppState,
    stores::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter, Stores, spawn_sweeper},
};

/// Body limit for every route except uploads.
const JSON_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Parser)]
#[command(name = "api")]
#[command(about = "Storefront catalog API server")]
struct Args {
    /// Run database migrations and exit
    #[arg(long)]
    migrate: bool,

    /// Create or reset an admin account and exit. The password is read from
    /// STOREFRONT_ADMIN_PASSWORD.
    #[arg(long, value_name = "EMAIL")]
    create_admin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = envy::prefixed("STOREFRONT_").from_env::<Config>()?;
    config.validate()?;

    // Initialize Sentry for error tracking (must be done early, guard must stay alive)
    let _sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.env.clone().into()),
                ..Default::default()
            },
        ))
    });

    // Set up tracing: JSON in production, human-readable otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let database = PgPoolOptions::new()
        .max_connections(25)
        .connect(&config.database_url)
        .await?;

    // Run migrations via init container only (--migrate flag)
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&database).await?;
        tracing::info!("Migrations complete");
        return Ok(());
    }

    let auth: Arc<dyn AuthService> = Arc::new(JwtAuthService::new(
        &config.jwt_secret,
        config.token_ttl_hours,
    ));

    if let Some(email) = args.create_admin {
        return create_admin(&database, auth.as_ref(), &email).await;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Build repositories
    let repos = Repos {
        users: Arc::new(PgUserRepo::new(database.clone())),
        products: Arc::new(PgProductRepo::new(database.clone())),
        assets: Arc::new(PgAssetRepo::new(database.clone())),
        audit: Arc::new(PgAuditRepo::new(database.clone())),
        status: Arc::new(PgStatusRepo::new(database)),
    };

    // Build stores
    let rate_limiter: Arc<dyn RateLimiter> = match config.rate_limit_backend {
        RateLimitBackend::Memory => {
            let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new(clock.clone()));
            spawn_sweeper(limiter.clone(), config.sweep_interval());
            limiter
        }
        RateLimitBackend::Redis => {
            let Some(url) = config.redis_url.as_deref() else {
                bail!("STOREFRONT_REDIS_URL is required when the rate limit backend is redis");
            };
            Arc::new(RedisRateLimiter::new(redis::Client::open(url)?, clock.clone()))
        }
    };
    tracing::info!(backend = ?config.rate_limit_backend, "Rate limiter ready");
    let stores = Stores { rate_limiter };

    let state = AppState {
        config: config.clone(),
        repos,
        stores,
        auth,
        files: Arc::new(LocalFileStorage::new(&config.upload_dir)),
        clock,
    };

    // Request ID header name
    let x_request_id = http::HeaderName::from_static("x-request-id");

    let api = Router::new()
        .nest("/health", handlers::health::router())
        .nest("/auth", handlers::auth::router())
        .nest("/catalog", handlers::catalog::router())
        .nest("/downloads", handlers::downloads::router())
        .nest("/admin", handlers::admin::router())
        .nest("/admin/audit", handlers::audit::router())
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT));

    let uploads = Router::new()
        .nest("/admin/uploads", handlers::uploads::router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes));

    let app = api
        .merge(uploads)
        .with_state(state)
        // Request ID: generate UUID, include in logs, return in response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &http::Request<axum::body::Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            },
        ))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn create_admin(database: &Pool<Postgres>, auth: &dyn AuthService, email: &str) -> Result<()> {
    let password = std::env::var("STOREFRONT_ADMIN_PASSWORD")
        .context("STOREFRONT_ADMIN_PASSWORD must be set to create an admin")?;
    if password.len() < 8 {
        bail!("admin password must be at least 8 characters");
    }

    let hash = auth.hash_password(&password).await?;
    let user = PgUserRepo::new(database.clone())
        .upsert(email, &hash, Role::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin account ready");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
