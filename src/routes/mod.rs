//! Router assembly.

mod common;
mod resources;

pub use common::common_routes;
pub use resources::{author_routes, book_routes};

use crate::openapi::openapi_json;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Full application: common routes, both resources, the OpenAPI document, and the middleware stack.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(author_routes(state.clone()))
        .merge(book_routes(state))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}
