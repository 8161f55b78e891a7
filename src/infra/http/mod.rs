pub mod api;
mod middleware;
mod public;
mod site_api;

pub use api::ApiState;
pub use api::rate_limit::ApiRateLimiter;
pub use public::HttpState;

use axum::Router;
use axum::extract::FromRef;
use axum::middleware as axum_middleware;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub api: ApiState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

/// Full application router: site pages, site JSON endpoints and the content API.
pub fn build_router(state: RouterState) -> Router {
    public::build_public_router()
        .merge(site_api::build_site_api_router())
        .merge(api::build_api_router(state.clone()))
        .fallback(public::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
