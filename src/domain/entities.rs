//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::{ContactStatus, PostSource, PostStatus, SubscriberStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
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
    pub views: i64,
    pub source: PostSource,
    pub external_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    /// Public path of the post on the blog.
    pub fn url(&self) -> String {
        post_url(&self.slug)
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

pub fn post_url(slug: &str) -> String {
    format!("/blog/{slug}")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactSubmissionRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub service_interest: Option<String>,
    pub budget_range: Option<String>,
    pub status: ContactStatus,
    pub notes: Option<String>,
    pub source: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterSubscriberRecord {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub status: SubscriberStatus,
    pub subscribed_at: OffsetDateTime,
    pub unsubscribed_at: Option<OffsetDateTime>,
    pub source: String,
}
