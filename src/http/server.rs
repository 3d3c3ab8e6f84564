//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile the validated config into policy objects held by `AppState`
//! - Build the route table once, yielding both the router and the registry
//! - Wire up the admission pipeline
//! - Serve with connect info and graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::books::{self, BookStore, InMemoryBookStore};
use crate::compression::CompressionPolicy;
use crate::config::validation::redact;
use crate::config::{ConfigError, GatewayConfig};
use crate::http::pipeline;
use crate::lifecycle::shutdown::wait_for;
use crate::routing::{RouteRegistry, RouteTable};
use crate::security::{CorsPolicy, HealthCheckBypass, RateLimiter, SecurityHeaders};

/// Shared state threaded through every middleware and handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RouteRegistry>,
    pub health_check: Arc<HealthCheckBypass>,
    /// `None` when limiting is disabled or its storage was unreachable at startup.
    pub limiter: Option<Arc<RateLimiter>>,
    pub compression: Arc<CompressionPolicy>,
    pub security_headers: Arc<SecurityHeaders>,
    pub cors: Arc<CorsPolicy>,
    pub books: Arc<dyn BookStore>,
    pub trust_forwarded_for: bool,
}

pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiting: bool,
}

impl HttpServer {
    /// Create a server backed by the seeded in-memory book store.
    pub async fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, Arc::new(InMemoryBookStore::seeded())).await
    }

    pub async fn with_store(
        config: GatewayConfig,
        books: Arc<dyn BookStore>,
    ) -> Result<Self, ConfigError> {
        let table = books::register(RouteTable::new(), &config.routing.api_prefix);
        let (routes, registry) = table.finish();

        let limiter = build_limiter(&config).await;
        let limiting = limiter.is_some();

        let state = AppState {
            registry: Arc::new(registry),
            health_check: Arc::new(
                HealthCheckBypass::from_config(&config.health_check).map_err(ConfigError::Policy)?,
            ),
            limiter,
            compression: Arc::new(CompressionPolicy::from_config(&config.compression)),
            security_headers: Arc::new(
                SecurityHeaders::from_config(&config.security_headers)
                    .map_err(ConfigError::Policy)?,
            ),
            cors: Arc::new(
                CorsPolicy::from_config(&config.cors, &config.routing.api_prefix)
                    .map_err(ConfigError::Policy)?,
            ),
            books,
            trust_forwarded_for: config.listener.trust_forwarded_for,
        };

        tracing::info!(
            routes = state.registry.len(),
            rate_limiting = limiting,
            compression = state.compression.enabled(),
            security_headers = state.security_headers.len(),
            "Admission pipeline ready"
        );

        let router = pipeline::apply(routes, &state, &config).with_state(state);
        Ok(Self {
            router,
            config,
            limiting,
        })
    }

    /// The fully layered router, for driving with `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Whether the rate limiter is active.
    pub fn is_limiting(&self) -> bool {
        self.limiting
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, profile = ?self.config.profile, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Connect the limiter; an unreachable backend disables limiting.
async fn build_limiter(config: &GatewayConfig) -> Option<Arc<RateLimiter>> {
    if !config.rate_limit.enabled {
        tracing::info!("Rate limiting disabled by configuration");
        return None;
    }

    let storage_url = config.storage_url();
    match RateLimiter::connect(&config.rate_limit, storage_url).await {
        Ok(limiter) => Some(Arc::new(limiter)),
        Err(err) => {
            tracing::error!(
                error = %err,
                storage = %redact(storage_url),
                "Rate limit storage unreachable, serving without rate limiting"
            );
            None
        }
    }
}
