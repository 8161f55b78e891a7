use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::domain::types::PostSource;

use super::error::ApiError;
use super::state::ApiState;

const API_KEY_HEADER: &str = "x-api-key";
const API_KEY_QUERY: &str = "api_key";
const WORKFLOW_HEADER: &str = "x-n8n-workflow";
const METRIC_RATE_LIMITED: &str = "duodriven_api_rate_limited_total";

/// Authenticated caller attached to API requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCaller {
    /// Where posts created by this request come from.
    pub source: PostSource,
    /// Rate-limit bucket for the caller.
    pub label: String,
}

impl ApiCaller {
    fn from_headers(headers: &HeaderMap) -> Self {
        match headers
            .get(WORKFLOW_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some(workflow) => Self {
                source: PostSource::N8n,
                label: format!("n8n:{}", workflow.trim()),
            },
            None => Self {
                source: PostSource::Api,
                label: "api".to_string(),
            },
        }
    }
}

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        warn!(
            target = "duodriven::api::auth",
            "API key not configured; rejecting authenticated request"
        );
        return ApiError::unauthorized().into_response();
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok().map(str::to_string))
        .or_else(|| query_api_key(request.uri().query()));

    let Some(provided) = provided else {
        return ApiError::unauthorized().into_response();
    };

    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        return ApiError::unauthorized().into_response();
    }

    let caller = ApiCaller::from_headers(request.headers());
    request.extensions_mut().insert(caller);

    next.run(request).await
}

pub async fn api_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let Some(caller) = request.extensions().get::<ApiCaller>() else {
        warn!(
            target = "duodriven::api::ratelimit",
            "missing caller in rate limit middleware"
        );
        return ApiError::unauthorized().into_response();
    };

    if !state.rate_limiter.allow(&caller.label, &route) {
        counter!(METRIC_RATE_LIMITED).increment(1);
        return ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    next.run(request).await
}

fn query_api_key(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == API_KEY_QUERY)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn api_key_is_read_from_query() {
        assert_eq!(
            query_api_key(Some("limit=5&api_key=s%3Dcret")),
            Some("s=cret".to_string())
        );
        assert_eq!(query_api_key(Some("limit=5")), None);
        assert_eq!(query_api_key(None), None);
    }

    #[test]
    fn workflow_header_marks_automation_provenance() {
        let mut headers = HeaderMap::new();
        assert_eq!(ApiCaller::from_headers(&headers).source, PostSource::Api);

        headers.insert(WORKFLOW_HEADER, HeaderValue::from_static("blog-writer"));
        let caller = ApiCaller::from_headers(&headers);
        assert_eq!(caller.source, PostSource::N8n);
        assert_eq!(caller.label, "n8n:blog-writer");
    }
}
