//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::{OffsetPage, PageRequest};
use crate::domain::entities::{ContactSubmissionRecord, NewsletterSubscriberRecord, PostRecord};
use crate::domain::posts::CategoryCount;
use crate::domain::types::{PostSource, PostStatus, SubscriberStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filter for the authenticated post listing.
#[derive(Debug, Clone, Default)]
pub struct PostQueryFilter {
    pub status: Option<PostStatus>,
    pub category: Option<String>,
}

/// Filter for the public listing; both fields apply to published posts only.
#[derive(Debug, Clone, Default)]
pub struct PublishedFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePostParams {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub published_at: Option<OffsetDateTime>,
    pub scheduled_for: Option<OffsetDateTime>,
    pub author: String,
    pub read_time: i32,
    pub source: PostSource,
    pub external_id: Option<String>,
}

/// Full replacement of the mutable columns of a post.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePostParams {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub published_at: Option<OffsetDateTime>,
    pub scheduled_for: Option<OffsetDateTime>,
    pub author: String,
    pub read_time: i32,
}

/// Published neighbours of a post ordered by publication time.
#[derive(Debug, Clone, Default)]
pub struct AdjacentPosts {
    pub previous: Option<PostRecord>,
    pub next: Option<PostRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostCounts {
    pub total: i64,
    pub published: i64,
    pub drafts: i64,
    pub scheduled: i64,
    pub total_views: i64,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    /// Whether any post other than `exclude_id` uses `slug`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, RepoError>;

    async fn count_slugs_with_prefix(&self, prefix: &str) -> Result<u64, RepoError>;

    /// Posts of any status ordered by creation time, newest first.
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError>;

    /// Published posts ordered by publication time, newest first.
    async fn list_published(
        &self,
        filter: &PublishedFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError>;

    async fn published_category_counts(&self) -> Result<Vec<CategoryCount>, RepoError>;

    /// Tag arrays of every published post in insertion (id) order.
    async fn published_tag_lists(&self) -> Result<Vec<Vec<String>>, RepoError>;

    async fn adjacent_published(
        &self,
        published_at: OffsetDateTime,
    ) -> Result<AdjacentPosts, RepoError>;

    async fn related_published(
        &self,
        category: &str,
        exclude_id: i64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Most recently published posts; every published post when `limit` is `None`.
    async fn recent_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError>;

    async fn post_counts(&self) -> Result<PostCounts, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Returns `false` when no post had the given id.
    async fn delete_post(&self, id: i64) -> Result<bool, RepoError>;

    /// Publish every scheduled post due at `now`, returning their ids ascending.
    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<i64>, RepoError>;

    /// Atomically bump the view counter, returning the new value.
    async fn increment_views(&self, id: i64) -> Result<i64, RepoError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSubscriberParams {
    pub email: String,
    pub name: Option<String>,
    pub source: String,
}

#[async_trait]
pub trait SubscribersRepo: Send + Sync {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriberRecord>, RepoError>;

    async fn create_subscriber(
        &self,
        params: CreateSubscriberParams,
    ) -> Result<NewsletterSubscriberRecord, RepoError>;

    async fn reactivate(&self, id: i64) -> Result<NewsletterSubscriberRecord, RepoError>;

    /// Subscribers with `status`, newest subscription first.
    async fn list_by_status(
        &self,
        status: SubscriberStatus,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError>;

    async fn count_by_status(&self, status: SubscriberStatus) -> Result<i64, RepoError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateContactParams {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub service_interest: Option<String>,
    pub budget_range: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactCounts {
    pub total: i64,
    pub new: i64,
}

#[async_trait]
pub trait ContactsRepo: Send + Sync {
    async fn create_submission(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactSubmissionRecord, RepoError>;

    async fn contact_counts(&self) -> Result<ContactCounts, RepoError>;
}

/// Connectivity check used by the database health endpoint.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
