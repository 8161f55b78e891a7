use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use duodriven_api_types::SubscriberListResponse;
use serde::Deserialize;

use crate::domain::types::SubscriberStatus;

use super::super::error::ApiError;
use super::super::models::subscriber_summary;
use super::super::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberListQuery {
    pub status: Option<String>,
}

pub async fn list_subscribers(
    State(state): State<ApiState>,
    query: Result<Query<SubscriberListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) =
        query.map_err(|err| ApiError::bad_request("Invalid query", Some(err.body_text())))?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => SubscriberStatus::Active,
        Some(raw) => raw.parse::<SubscriberStatus>().map_err(|err| {
            ApiError::bad_request("Invalid status filter", Some(err.to_string()))
        })?,
    };

    let subscribers = state.newsletter.list(status).await?;
    Ok(Json(SubscriberListResponse {
        total: subscribers.len(),
        subscribers: subscribers.into_iter().map(subscriber_summary).collect(),
    }))
}
