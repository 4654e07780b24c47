use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{Authenticate, Authenticator, TokenCodec};
use crate::config::{AppConfig, Environment};
use crate::database::{DatabaseManager, MemoryUserStore, PgUserStore, UserStore};
use crate::handlers::{protected, public};
use crate::middleware::require_principal;
use crate::registry::{RegistryError, ServiceRegistry};
use crate::services::{LicenseService, LogChallengeSink, LoginService, TokenService, UserService};

/// Handles resolved from the registry once, at startup, and cloned into
/// every request.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<dyn Authenticate>,
    pub users: Arc<UserService>,
    pub tokens: Arc<TokenService>,
    pub logins: Arc<LoginService>,
    pub license: Arc<LicenseService>,
}

impl AppState {
    pub fn from_registry(registry: &ServiceRegistry) -> Result<Self, RegistryError> {
        let authenticator: Arc<dyn Authenticate> = registry.get::<Authenticator>()?;

        Ok(Self {
            authenticator,
            users: registry.get::<UserService>()?,
            tokens: registry.get::<TokenService>()?,
            logins: registry.get::<LoginService>()?,
            license: registry.get::<LicenseService>()?,
        })
    }
}

/// Construct and register every service against `store`.
///
/// The token codec is built once; the token service signs with the same
/// instance the authenticator verifies with.
pub fn build_registry(config: &AppConfig, store: Arc<dyn UserStore>) -> anyhow::Result<ServiceRegistry> {
    let secret = config.token_secret()?;
    let codec = Arc::new(TokenCodec::new(&secret).context("failed to build token codec")?);

    let mut registry = ServiceRegistry::new();
    registry.register(LicenseService::new())?;
    registry.register(UserService::new(store.clone()))?;
    registry.register(TokenService::new(codec.clone(), config.token_ttl()))?;
    registry.register(Authenticator::new(codec, store.clone()))?;
    registry.register(LoginService::new(
        store,
        Arc::new(LogChallengeSink),
        config.challenge_ttl(),
        config.security.expose_challenge,
    ))?;

    tracing::info!(services = ?registry.names(), "Service registry ready");
    Ok(registry)
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .route("/auth/whoami", get(protected::whoami))
        .route("/users", get(protected::list_users).post(protected::create_user))
        .route(
            "/users/:id",
            get(protected::get_user)
                .put(protected::update_user)
                .delete(protected::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            require_principal,
        ));

    let mut app = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/license", get(public::license))
        .route("/auth/challenge", post(public::challenge_post))
        .route("/auth/token", post(public::token_post))
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(config) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    let security = &config.security;
    if !security.enable_cors {
        return None;
    }

    if security.cors_origins.is_empty() {
        if config.environment == Environment::Development {
            return Some(CorsLayer::permissive());
        }
        tracing::warn!("CORS enabled without origins; cross-origin requests will be refused");
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on exit");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let pool = DatabaseManager::open(&config.database)
        .await
        .context("failed to open database")?;
    Ok(Arc::new(PgUserStore::new(pool)))
}

/// Wire the services and serve until ctrl-c
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!("Starting userdesk in {:?} mode", config.environment);

    let store = open_store(&config).await?;
    let registry = build_registry(&config, store)?;
    let state = AppState::from_registry(&registry)?;

    let seeded = state.users.seed(&config.seed_users).await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "Seeded users");
    }

    let app = router(state, &config);
    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("userdesk listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
