pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use scopecast_core::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, SessionSnapshot};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Session
        .route("/api/session", get(routes::session::get_session))
        .route("/api/session/dismiss", post(routes::session::dismiss_error))
        .route("/api/reset", post(routes::session::reset))
        // Analysis
        .route("/api/analyze", post(routes::analyze::analyze))
        // Rates
        .route(
            "/api/rates/{role}",
            put(routes::rates::put_rate).delete(routes::rates::delete_rate),
        )
        // Roles
        .route("/api/roles", get(routes::roles::list_roles))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server on `0.0.0.0:{port}`.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Start the API server on a pre-bound listener.
///
/// Unlike `serve`, the caller can read the actual port before starting
/// (useful when `port = 0` and the OS picks a free port).
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = AppState::new(config)?;
    if !app_state.client.has_api_key() {
        tracing::warn!(
            "no API key in ${}: analysis requests will fail with 503",
            app_state.config.ai.api_key_env
        );
    }
    let app = build_router(app_state);

    tracing::info!("scopecast API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
