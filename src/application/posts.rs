//! Post lifecycle service behind the authenticated content API.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::application::pagination::{OffsetPage, PageRequest};
use crate::application::repos::{
    CreatePostParams, PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::posts::{
    DEFAULT_AUTHOR, DEFAULT_CATEGORY, Publication, default_meta_description, default_meta_title,
    derive_excerpt, parse_timestamp, read_time_minutes,
};
use crate::domain::slug::{
    SlugAsyncError, SlugError, SlugLookup, resolve_slug_for_create, resolve_slug_for_update,
};
use crate::domain::types::{PostSource, PostStatus};

const METRIC_POSTS_CREATED: &str = "duodriven_posts_created_total";
const METRIC_POSTS_UPDATED: &str = "duodriven_posts_updated_total";
const METRIC_POSTS_DELETED: &str = "duodriven_posts_deleted_total";
const METRIC_POSTS_SWEPT: &str = "duodriven_posts_published_by_sweep_total";

const SLUG_CONSTRAINT: &str = "posts_slug_key";

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("post not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<DomainError> for PostServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } => Self::NotFound,
            DomainError::Validation { message } => Self::Validation(message),
            DomainError::Invariant { message } => {
                Self::Repo(RepoError::Integrity { message })
            }
        }
    }
}

impl From<SlugAsyncError<RepoError>> for PostServiceError {
    fn from(err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. }) => {
                Self::Validation("title must contain at least one letter or digit".to_string())
            }
            SlugAsyncError::Slug(err @ SlugError::Exhausted { .. }) => {
                Self::Conflict(err.to_string())
            }
            SlugAsyncError::Lookup(err) => Self::Repo(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub status: Option<PostStatus>,
    pub author: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub external_id: Option<String>,
    pub scheduled_for: Option<String>,
    pub source: Option<PostSource>,
}

/// Partial update; `None` leaves a field untouched and `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostCommand {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<Option<String>>,
    pub status: Option<PostStatus>,
    pub author: Option<String>,
    pub meta_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
    pub scheduled_for: Option<Option<String>>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
}

impl PostService {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn get(&self, id: i64) -> Result<PostRecord, PostServiceError> {
        self.reader
            .find_by_id(id)
            .await?
            .ok_or(PostServiceError::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<PostRecord, PostServiceError> {
        self.reader
            .find_by_slug(slug)
            .await?
            .ok_or(PostServiceError::NotFound)
    }

    pub async fn list(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, PostServiceError> {
        Ok(self.reader.list_posts(filter, page).await?)
    }

    #[instrument(skip(self, command), fields(title = %command.title))]
    pub async fn create(&self, command: CreatePostCommand) -> Result<PostRecord, PostServiceError> {
        self.create_at(command, OffsetDateTime::now_utc()).await
    }

    pub async fn create_at(
        &self,
        command: CreatePostCommand,
        now: OffsetDateTime,
    ) -> Result<PostRecord, PostServiceError> {
        let title = command.title.trim().to_string();
        if title.is_empty() || command.content.trim().is_empty() {
            return Err(PostServiceError::Validation(
                "title and content are required".to_string(),
            ));
        }

        let scheduled_for = command
            .scheduled_for
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_timestamp("scheduled_for", raw))
            .transpose()?;

        let publication = Publication {
            scheduled_for,
            ..Publication::draft()
        }
        .transition(command.status.unwrap_or(PostStatus::Draft), now)?;

        let excerpt = command
            .excerpt
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| derive_excerpt(&command.content));
        let meta_title = command
            .meta_title
            .unwrap_or_else(|| default_meta_title(&title));
        let meta_description = command
            .meta_description
            .unwrap_or_else(|| default_meta_description(&excerpt));
        let source = command.source.unwrap_or(PostSource::Api);

        let mut params = CreatePostParams {
            slug: String::new(),
            read_time: read_time_minutes(&command.content),
            title,
            excerpt,
            content: command.content,
            featured_image: command.featured_image,
            meta_title: Some(meta_title),
            meta_description: Some(meta_description),
            category: command
                .category
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: command.tags.unwrap_or_default(),
            status: publication.status,
            published_at: publication.published_at,
            scheduled_for: publication.scheduled_for,
            author: command
                .author
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            source,
            external_id: command.external_id,
        };

        // A concurrent creator may claim the same slug between lookup and insert.
        let mut retried = false;
        let post = loop {
            let lookup = RepoSlugLookup(self.reader.as_ref());
            params.slug = resolve_slug_for_create(&params.title, &lookup).await?;

            match self.writer.create_post(params.clone()).await {
                Ok(post) => break post,
                Err(RepoError::Duplicate { constraint })
                    if constraint == SLUG_CONSTRAINT && !retried =>
                {
                    warn!(slug = %params.slug, "slug claimed concurrently, resolving again");
                    retried = true;
                }
                Err(RepoError::Duplicate { .. }) => {
                    return Err(PostServiceError::Conflict(format!(
                        "slug `{}` is already in use",
                        params.slug
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        };

        counter!(METRIC_POSTS_CREATED, "source" => source.as_str()).increment(1);
        info!(id = post.id, slug = %post.slug, status = %post.status, "post created");
        Ok(post)
    }

    #[instrument(skip(self, command))]
    pub async fn update(
        &self,
        id: i64,
        command: UpdatePostCommand,
    ) -> Result<PostRecord, PostServiceError> {
        self.update_at(id, command, OffsetDateTime::now_utc()).await
    }

    pub async fn update_at(
        &self,
        id: i64,
        command: UpdatePostCommand,
        now: OffsetDateTime,
    ) -> Result<PostRecord, PostServiceError> {
        let current = self.get(id).await?;

        let mut slug = current.slug.clone();
        let title = match command.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(PostServiceError::Validation(
                        "title must not be empty".to_string(),
                    ));
                }
                let reader = self.reader.clone();
                slug = resolve_slug_for_update(&title, &current.slug, |candidate| async move {
                    reader.slug_exists(&candidate, Some(id)).await
                })
                .await?;
                title
            }
            None => current.title.clone(),
        };

        let (content, read_time) = match command.content {
            Some(content) => {
                let minutes = read_time_minutes(&content);
                (content, minutes)
            }
            None => (current.content.clone(), current.read_time),
        };

        let scheduled_for = match command.scheduled_for {
            Some(Some(raw)) if !raw.trim().is_empty() => {
                Some(parse_timestamp("scheduled_for", &raw)?)
            }
            Some(_) => None,
            None => current.scheduled_for,
        };

        let mut publication = Publication {
            status: current.status,
            published_at: current.published_at,
            scheduled_for,
        };
        if let Some(target) = command.status {
            publication = publication.transition(target, now)?;
        } else if publication.status == PostStatus::Scheduled && publication.scheduled_for.is_none()
        {
            return Err(DomainError::validation(
                "scheduled_for is required when status is scheduled",
            )
            .into());
        }

        let params = UpdatePostParams {
            id,
            title,
            slug,
            excerpt: command.excerpt.unwrap_or(current.excerpt),
            content,
            featured_image: command.featured_image.unwrap_or(current.featured_image),
            meta_title: command.meta_title.unwrap_or(current.meta_title),
            meta_description: command.meta_description.unwrap_or(current.meta_description),
            category: command.category.unwrap_or(current.category),
            tags: command.tags.unwrap_or(current.tags),
            status: publication.status,
            published_at: publication.published_at,
            scheduled_for: publication.scheduled_for,
            author: command.author.unwrap_or(current.author),
            read_time,
        };

        let post = match self.writer.update_post(params).await {
            Ok(post) => post,
            Err(RepoError::NotFound) => return Err(PostServiceError::NotFound),
            Err(RepoError::Duplicate { .. }) => {
                return Err(PostServiceError::Conflict(
                    "slug is already in use by another post".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        counter!(METRIC_POSTS_UPDATED).increment(1);
        info!(id = post.id, slug = %post.slug, status = %post.status, "post updated");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), PostServiceError> {
        if !self.writer.delete_post(id).await? {
            return Err(PostServiceError::NotFound);
        }
        counter!(METRIC_POSTS_DELETED).increment(1);
        info!(id, "post deleted");
        Ok(())
    }

    /// Publish every scheduled post that is due now.
    pub async fn publish_scheduled(&self) -> Result<Vec<i64>, PostServiceError> {
        self.publish_scheduled_at(OffsetDateTime::now_utc()).await
    }

    #[instrument(skip(self))]
    pub async fn publish_scheduled_at(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<i64>, PostServiceError> {
        let ids = self.writer.publish_due(now).await?;
        if !ids.is_empty() {
            counter!(METRIC_POSTS_SWEPT).increment(ids.len() as u64);
            info!(count = ids.len(), ids = ?ids, "published scheduled posts");
        }
        Ok(ids)
    }
}

struct RepoSlugLookup<'a>(&'a dyn PostsRepo);

impl SlugLookup for RepoSlugLookup<'_> {
    type Error = RepoError;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        self.0.slug_exists(slug, None).await
    }

    async fn count_with_prefix(&self, prefix: &str) -> Result<u64, RepoError> {
        self.0.count_slugs_with_prefix(prefix).await
    }
}
