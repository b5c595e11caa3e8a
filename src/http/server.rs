//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, cache headers)
//! - Start one guarded autostart run per request
//! - Hand the run's result to the matching responder

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AutostartConfig;
use crate::http::document::{DocumentParams, OdcTemplate};
use crate::http::responders;
use crate::orchestrator::{Orchestrator, TimeoutGuard};

/// Slack between the autostart deadline and the HTTP request timeout, so the
/// guard always answers first.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub guard: TimeoutGuard,
    pub template: Arc<OdcTemplate>,
}

impl AppState {
    async fn wake(&self) -> crate::orchestrator::OrchestrationResult {
        self.guard.run(self.orchestrator.clone()).await
    }
}

/// HTTP server for the autostart service.
pub struct HttpServer {
    router: Router,
    config: AutostartConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: AutostartConfig,
        orchestrator: Arc<Orchestrator>,
        guard: TimeoutGuard,
        template: OdcTemplate,
    ) -> Self {
        let state = AppState {
            orchestrator,
            guard,
            template: Arc::new(template),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_timeout = state.guard.deadline().saturating_add(REQUEST_TIMEOUT_SLACK);

        Router::new()
            .route("/", get(connection_string))
            .route("/odc", get(odc_default))
            .route("/odc/{database}", get(odc_database))
            .route("/odc/{database}/{cube}", get(odc_cube))
            .route("/health", get(health))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::EXPIRES,
                HeaderValue::from_static("-1"),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom listener or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            server = %self.config.resource.server_name,
            deadline_secs = self.config.orchestration.deadline_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wake the server and answer with its connection string.
async fn connection_string(State(state): State<AppState>) -> Response {
    responders::plain(state.wake().await)
}

async fn odc_default(State(state): State<AppState>) -> Response {
    odc_response(state, None, None).await
}

async fn odc_database(State(state): State<AppState>, Path(database): Path<String>) -> Response {
    odc_response(state, Some(database), None).await
}

async fn odc_cube(
    State(state): State<AppState>,
    Path((database, cube)): Path<(String, String)>,
) -> Response {
    odc_response(state, Some(database), Some(cube)).await
}

/// Wake the server and answer with an ODC document for the requested cube.
async fn odc_response(state: AppState, database: Option<String>, cube: Option<String>) -> Response {
    let params = DocumentParams::from_segments(
        state.orchestrator.identity().server_name(),
        database.as_deref(),
        cube.as_deref(),
    );
    let result = state.wake().await;
    responders::odc(result, &state.template, &params)
}

async fn health() -> &'static str {
    "ok"
}
