use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use duodriven_api_types::{
    PostCreateRequest, PostDeletedResponse, PostListResponse, PostUpdateRequest,
    PublishScheduledResponse,
};
use serde::Deserialize;

use crate::application::pagination::PageRequest;
use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::application::repos::PostQueryFilter;
use crate::domain::types::PostStatus;

use super::super::error::ApiError;
use super::super::middleware::ApiCaller;
use super::super::models::{mutation_response, post_response};
use super::super::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PostListQuery {
    fn filter(&self) -> Result<PostQueryFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(raw.parse::<PostStatus>().map_err(|err| {
                ApiError::bad_request("Invalid status filter", Some(err.to_string()))
            })?),
        };
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(PostQueryFilter { status, category })
    }
}

pub async fn list_posts(
    State(state): State<ApiState>,
    query: Result<Query<PostListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) =
        query.map_err(|err| ApiError::bad_request("Invalid query", Some(err.body_text())))?;
    let filter = query.filter()?;
    let page = PageRequest::from_api(query.limit, query.offset);

    let listing = state.posts.list(&filter, page).await?;
    let total = i64::try_from(listing.total).unwrap_or(i64::MAX);

    Ok(Json(PostListResponse {
        total,
        limit: page.limit,
        offset: page.offset,
        posts: listing.items.into_iter().map(post_response).collect(),
    }))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get(id).await?;
    Ok(Json(post_response(post)))
}

pub async fn get_post_by_slug(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_by_slug(&slug).await?;
    Ok(Json(post_response(post)))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(caller): Extension<ApiCaller>,
    payload: Result<Json<PostCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|err| ApiError::bad_request("Invalid JSON body", Some(err.body_text())))?;

    let (Some(title), Some(content)) = (payload.title, payload.content) else {
        return Err(ApiError::validation("title and content are required"));
    };

    let command = CreatePostCommand {
        title,
        content,
        excerpt: payload.excerpt,
        category: payload.category,
        tags: payload.tags,
        featured_image: payload.featured_image,
        status: payload.status,
        author: payload.author,
        meta_title: payload.meta_title,
        meta_description: payload.meta_description,
        external_id: payload.external_id,
        scheduled_for: payload.scheduled_for,
        source: Some(caller.source),
    };

    let post = state.posts.create(command).await?;
    Ok((StatusCode::CREATED, Json(mutation_response(&post, true))))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Result<Json<PostUpdateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload
        .map_err(|err| ApiError::bad_request("Invalid JSON body", Some(err.body_text())))?;
    if payload.is_empty() {
        return Err(ApiError::validation("No data provided"));
    }

    let command = UpdatePostCommand {
        title: payload.title,
        content: payload.content,
        excerpt: payload.excerpt,
        category: payload.category,
        tags: payload.tags,
        featured_image: payload.featured_image,
        status: payload.status,
        author: payload.author,
        meta_title: payload.meta_title,
        meta_description: payload.meta_description,
        scheduled_for: payload.scheduled_for,
    };

    let post = state.posts.update(id, command).await?;
    Ok(Json(mutation_response(&post, false)))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete(id).await?;
    Ok(Json(PostDeletedResponse {
        success: true,
        message: format!("Post {id} deleted"),
    }))
}

pub async fn publish_scheduled(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = state.posts.publish_scheduled().await?;
    Ok(Json(PublishScheduledResponse {
        success: true,
        published_count: ids.len(),
        published_ids: ids,
    }))
}
