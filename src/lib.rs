use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod adzuna;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use adzuna::JobsProvider;

#[derive(Clone)]
pub struct AppState {
    pub api_token: Option<Arc<str>>,
    pub jobs_provider: Arc<dyn JobsProvider>,
}

impl AppState {
    pub fn new(api_token: Option<String>, jobs_provider: Arc<dyn JobsProvider>) -> Self {
        Self {
            api_token: api_token.map(Arc::<str>::from),
            jobs_provider,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/version", get(http::handlers::get_api_version))
        .route("/jobs/search", get(http::handlers::search_jobs))
        .route("/jobs/categories", get(http::handlers::get_categories))
        .route("/jobs/top-companies", get(http::handlers::get_top_companies))
        .route("/jobs/histogram", get(http::handlers::get_salary_histogram))
        .route("/jobs/geodata", get(http::handlers::get_geodata))
        .route("/jobs/history", get(http::handlers::get_salary_history))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
