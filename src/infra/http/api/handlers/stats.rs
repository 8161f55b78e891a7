use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::super::error::ApiError;
use super::super::models::stats_response;
use super::super::state::ApiState;

pub async fn get_stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.stats.collect().await?;
    Ok(Json(stats_response(stats)))
}
