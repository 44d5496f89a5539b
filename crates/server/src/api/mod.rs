pub mod categories;
pub mod evaluate;
pub mod health;
pub mod openapi;
pub mod rules;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dikast_rules::RuleRepository;

use crate::config::DikastConfig;

use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The rule repository; readers take the read guard, writers the
    /// write guard, so every operation observes a consistent snapshot.
    pub repository: Arc<RwLock<RuleRepository>>,
    /// Configuration loaded at startup.
    pub config: Arc<DikastConfig>,
}

impl AppState {
    /// Create the state with an empty repository.
    pub fn new(config: DikastConfig) -> Self {
        Self {
            repository: Arc::new(RwLock::new(RuleRepository::new())),
            config: Arc::new(config),
        }
    }
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/rules", post(rules::store).get(rules::list))
        .route("/rules/validate", post(rules::validate))
        .route("/rules/categories", post(categories::update))
        .route("/evaluate", post(evaluate::evaluate))
        .route("/evaluate/by-data", post(evaluate::evaluate_by_data))
        .route("/evaluate/with-rules", post(evaluate::evaluate_with_rules))
        .route("/evaluate/stats", get(evaluate::stats))
        .route(
            "/evaluate/failure-details/{rule_name}",
            get(evaluate::failure_details),
        );

    let cors = cors_layer(&state.config.api.allowed_origins);
    let prefix = state.config.api.prefix.clone();

    Router::new()
        .nest(&prefix, api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
