use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::ai::SuggestionClient;
use crate::config::Config;
use crate::media::MediaStore;
use crate::middleware::rate_limit::{AUTH_MAX_ATTEMPTS, AUTH_WINDOW_SECS};
use crate::middleware::{
    admin_middleware, auth_middleware, quota_middleware, rate_limit_middleware, RateLimiter,
};

pub mod admin;
pub mod auth;
pub mod follows;
pub mod health;
pub mod ingredients;
pub mod likes;
pub mod recipes;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub suggestions: Arc<dyn SuggestionClient>,
    pub media: Arc<dyn MediaStore>,
}

/// The API's success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// Shared pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

pub fn router(state: AppState) -> Router {
    // One shared window for both credential endpoints.
    let auth_limiter = Arc::new(RateLimiter::new(AUTH_MAX_ATTEMPTS, AUTH_WINDOW_SECS));
    let credentials = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_limiter,
            rate_limit_middleware,
        ));

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .merge(credentials)
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password/{token}", post(auth::reset_password))
        .route("/users", get(users::list))
        .route("/users/{id}", get(users::get_one))
        .route("/users/{id}/followers", get(follows::followers))
        .route("/users/{id}/following", get(follows::following))
        .route("/recipes", get(recipes::list))
        .route("/recipes/{id}", get(recipes::get_one))
        .route("/ingredients", get(ingredients::list))
        .route("/ingredients/{id}", get(ingredients::get_one));

    let suggested = Router::new()
        .route("/recipes/suggested", get(recipes::suggested))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            quota_middleware,
        ));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users/{id}", patch(users::update).delete(users::remove))
        .route("/users/{id}/recent-ops", get(users::recent_ops))
        .route("/users/{id}/image", post(users::upload_image))
        .route(
            "/users/{id}/follow",
            put(follows::follow).delete(follows::unfollow),
        )
        .route("/recipes", post(recipes::create))
        .route(
            "/recipes/{id}",
            patch(recipes::update).delete(recipes::remove),
        )
        .route("/recipes/{id}/image", post(recipes::upload_image))
        .route(
            "/recipes/{id}/like",
            put(likes::like).delete(likes::unlike),
        )
        .route("/ingredients", post(ingredients::create))
        .route(
            "/ingredients/{id}",
            patch(ingredients::update).delete(ingredients::remove),
        )
        .merge(suggested)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin = Router::new()
        .route("/admin/import/recipes", post(admin::import_recipes))
        .route("/admin/import/ingredients", post(admin::import_ingredients))
        .route("/admin/import/users", post(admin::import_users))
        .route("/admin/templates/recipes", get(admin::recipes_template))
        .route(
            "/admin/templates/ingredients",
            get(admin::ingredients_template),
        )
        .route("/admin/templates/users", get(admin::users_template))
        .route_layer(axum_middleware::from_fn(admin_middleware))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public.merge(protected).merge(admin).with_state(state)
}
