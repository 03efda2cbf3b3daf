//! tastebook: a recipe-sharing platform backend. JSON HTTP API over
//! sqlite, with ingredient resolution, AI recipe suggestions and bulk
//! CSV import built on the workspace crates.

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod ai;
pub mod config;
pub mod email;
pub mod error;
pub mod imports;
pub mod jwt;
pub mod media;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod seed;

pub use routes::AppState;

/// Build the full application router. Integration tests drive this
/// directly with `tower::ServiceExt::oneshot`.
pub fn create_app(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
