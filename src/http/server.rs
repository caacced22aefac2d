//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the five gateway routes
//! - Answer unknown paths and wrong methods with error envelopes
//! - Attach each route's rate-limit policy
//! - Wire up middleware (tracing, request ID, body limit)
//! - Bind server to listener and drain on shutdown
//! - Sweep idle rate-limit buckets in the background

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers::{
    create_reservation, create_search, delete_reservation, delete_reservation_without_id,
    method_not_allowed, not_found, poll_reservation, poll_reservation_without_id, poll_search,
    poll_search_without_id,
};
use crate::http::operation::{
    CREATE_RESERVATION, CREATE_SEARCH, DELETE_RESERVATION, POLL_RESERVATION, POLL_SEARCH,
};
use crate::http::request::{make_request_span, x_request_id, UuidRequestId};
use crate::security::rate_limit::{rate_limit_middleware, LimitPolicy, Rate, RateLimiter, RouteLimit};
use crate::upstream::{UpstreamClient, UpstreamError};
use crate::validation::{SchemaError, Schemas};

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub schemas: Arc<Schemas>,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ServerError> {
        Ok(Self {
            upstream: UpstreamClient::new(&config.upstream)?,
            schemas: Arc::new(Schemas::compile()?),
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let router = Self::build_router(&config, state, limiter.clone());

        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &GatewayConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let poll_rate = Rate::per_second(config.rate_limit.poll_per_second);
        let limited = |route: MethodRouter<AppState>, scope: &'static str, policy: LimitPolicy| {
            let guard = RouteLimit {
                limiter: limiter.clone(),
                scope,
                policy,
            };
            route.layer(middleware::from_fn_with_state(guard, rate_limit_middleware))
        };

        Router::new()
            .route(
                "/search/",
                limited(post(create_search), CREATE_SEARCH.name, LimitPolicy::Default),
            )
            .route(
                "/search/{search_id}/poll/",
                limited(get(poll_search), POLL_SEARCH.name, LimitPolicy::Override(poll_rate)),
            )
            .route(
                "/search//poll/",
                limited(
                    get(poll_search_without_id),
                    POLL_SEARCH.name,
                    LimitPolicy::Override(poll_rate),
                ),
            )
            .route(
                "/reservations/",
                limited(post(create_reservation), CREATE_RESERVATION.name, LimitPolicy::Default),
            )
            .route(
                "/reservations/{search_id}/poll/",
                limited(
                    get(poll_reservation),
                    POLL_RESERVATION.name,
                    LimitPolicy::Additive(poll_rate),
                ),
            )
            .route(
                "/reservations//poll/",
                limited(
                    get(poll_reservation_without_id),
                    POLL_RESERVATION.name,
                    LimitPolicy::Additive(poll_rate),
                ),
            )
            .route(
                "/reservations/{reservation_id}/",
                limited(delete(delete_reservation), DELETE_RESERVATION.name, LimitPolicy::Default),
            )
            .route(
                "/reservations//",
                limited(
                    delete(delete_reservation_without_id),
                    DELETE_RESERVATION.name,
                    LimitPolicy::Default,
                ),
            )
            .method_not_allowed_fallback(method_not_allowed)
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(PropagateRequestIdLayer::new(x_request_id()))
            .layer(SetRequestIdLayer::new(x_request_id(), UuidRequestId))
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        let pruner = self.spawn_pruner();

        // Peer addresses key the rate limiter
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(pruner) = pruner {
            pruner.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_pruner(&self) -> Option<JoinHandle<()>> {
        let settings = &self.config.rate_limit;
        if !settings.enabled {
            return None;
        }

        let limiter = self.limiter.clone();
        let every = Duration::from_secs(settings.prune_interval_secs);
        let idle = Duration::from_secs(settings.idle_ttl_secs);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = limiter.prune(idle);
                if removed > 0 {
                    tracing::debug!(removed, remaining = limiter.len(), "Pruned idle rate-limit buckets");
                }
            }
        }))
    }

    /// A clone of the assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
