//! Public JSON endpoints used by the site's own pages.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use duodriven_api_types::{
    ChatFallbackResponse, ChatRequest, ContactRequest, ContactResponse, HealthResponse,
    SubscribeRequest, SubscribeResponse,
};
use time::OffsetDateTime;

use crate::application::chat::ChatError;
use crate::application::contact::{CONTACT_SUCCESS_MESSAGE, ContactCommand};
use crate::application::error::ErrorReport;
use crate::application::newsletter::{SubscribeCommand, SubscribeOutcome};
use crate::domain::posts::format_rfc3339;

use super::RouterState;
use super::api::error::ApiError;
use super::public::HttpState;

const SERVICE_NAME: &str = "duodriven-web";

pub fn build_site_api_router() -> Router<RouterState> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/contact", post(contact))
        .route("/api/health", get(health))
        .route("/api/health/db", get(health_db))
        .route("/api/v1/newsletter/subscribe", post(subscribe))
}

async fn chat(
    State(state): State<HttpState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    const SOURCE: &str = "infra::http::site_api::chat";

    // A malformed body still reaches the workflow as an empty message.
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let message = request.message.unwrap_or_default();
    let session_id = request.session_id.filter(|id| !id.trim().is_empty());

    match state.chat.ask(message, session_id).await {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => {
            let status = match err {
                ChatError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ChatError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ChatError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let body = ChatFallbackResponse {
                error: err.to_string(),
                reply: err.reply().to_string(),
            };
            let mut response = (status, Json(body)).into_response();
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            response
        }
    }
}

async fn contact(
    State(state): State<HttpState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    const SOURCE: &str = "infra::http::site_api::contact";

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let command = ContactCommand {
        name: request.name,
        email: request.email,
        message: request.message,
        company: request.company,
        phone: request.phone,
        service_interest: request.service_interest,
        budget_range: request.budget_range,
        utm_source: request.utm_source,
        utm_medium: request.utm_medium,
        utm_campaign: request.utm_campaign,
    };

    match state.contact.submit(command).await {
        Ok(()) => Json(ContactResponse {
            success: true,
            message: Some(CONTACT_SUCCESS_MESSAGE.to_string()),
            error: None,
        })
        .into_response(),
        Err(err) => {
            let body = ContactResponse {
                success: false,
                message: None,
                error: Some(err.to_string()),
            };
            let mut response = (StatusCode::BAD_REQUEST, Json(body)).into_response();
            ErrorReport::from_error(SOURCE, StatusCode::BAD_REQUEST, &err).attach(&mut response);
            response
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: format_rfc3339(OffsetDateTime::now_utc()),
    })
}

async fn health_db(State(state): State<HttpState>) -> Response {
    const SOURCE: &str = "infra::http::site_api::health_db";

    match state.health.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            timestamp: format_rfc3339(OffsetDateTime::now_utc()),
        })
        .into_response(),
        Err(err) => {
            let body = HealthResponse {
                status: "unhealthy".to_string(),
                service: SERVICE_NAME.to_string(),
                timestamp: format_rfc3339(OffsetDateTime::now_utc()),
            };
            let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
            ErrorReport::from_error(SOURCE, StatusCode::SERVICE_UNAVAILABLE, &err)
                .attach(&mut response);
            response
        }
    }
}

async fn subscribe(
    State(state): State<HttpState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let outcome = state
        .newsletter
        .subscribe(SubscribeCommand {
            email: request.email,
            name: request.name,
            source: request.source,
        })
        .await?;

    let status = match outcome {
        SubscribeOutcome::Created => StatusCode::CREATED,
        SubscribeOutcome::AlreadySubscribed | SubscribeOutcome::Reactivated => StatusCode::OK,
    };
    Ok((
        status,
        Json(SubscribeResponse {
            success: true,
            message: outcome.message().to_string(),
        }),
    )
        .into_response())
}
