//! Request and response shapes for the DUODRIVEN publishing API.
//!
//! These types are shared by the server and by automation clients. Timestamps
//! travel as RFC 3339 strings so consumers do not need a particular date
//! library to parse them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "post_status", rename_all = "snake_case")
)]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Originating system of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "post_source", rename_all = "snake_case")
)]
pub enum PostSource {
    Manual,
    Api,
    #[serde(rename = "n8n")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "n8n"))]
    N8n,
}

impl PostSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PostSource::Manual => "manual",
            PostSource::Api => "api",
            PostSource::N8n => "n8n",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "subscriber_status", rename_all = "snake_case")
)]
pub enum SubscriberStatus {
    Active,
    Unsubscribed,
}

impl FromStr for SubscriberStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(SubscriberStatus::Active),
            "unsubscribed" => Ok(SubscriberStatus::Unsubscribed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "contact_status", rename_all = "snake_case")
)]
pub enum ContactStatus {
    New,
    Contacted,
    Qualified,
    Closed,
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>` field: absent → `None`, `null` → `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ----- posts -----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostCreateRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub featured_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_title: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta_description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_for: Option<Option<String>>,
}

impl PostUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.excerpt.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.featured_image.is_none()
            && self.status.is_none()
            && self.author.is_none()
            && self.meta_title.is_none()
            && self.meta_description.is_none()
            && self.scheduled_for.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
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
    pub published_at: Option<String>,
    pub scheduled_for: Option<String>,
    pub author: String,
    pub read_time: i32,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    pub source: PostSource,
    pub external_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub total: i64,
    pub limit: u32,
    pub offset: u64,
    pub posts: Vec<PostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMutationResponse {
    pub success: bool,
    pub id: i64,
    pub slug: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDeletedResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishScheduledResponse {
    pub success: bool,
    pub published_count: usize,
    pub published_ids: Vec<i64>,
}

// ----- newsletter -----

/// Read a free-text form field, accepting numbers and booleans as text.
///
/// Any other JSON type reads as absent so one odd field never voids the
/// rest of the submission.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        Some(serde_json::Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberSummary {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub subscribed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberListResponse {
    pub total: usize,
    pub subscribers: Vec<SubscriberSummary>,
}

// ----- stats -----

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogStats {
    pub total_posts: i64,
    pub published: i64,
    pub drafts: i64,
    pub scheduled: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterStats {
    pub total_subscribers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    pub total: i64,
    pub new: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub blog: BlogStats,
    pub newsletter: NewsletterStats,
    pub contacts: ContactStats,
}

// ----- site endpoints -----

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_id: Option<String>,
}

/// Fallback body returned when the chat upstream cannot answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFallbackResponse {
    pub error: String,
    pub reply: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_interest: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub budget_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub utm_source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub utm_medium: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub utm_campaign: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

/// Error body shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let request: PostUpdateRequest =
            serde_json::from_str(r#"{"featured_image": null, "title": "T"}"#).expect("parse");
        assert_eq!(request.featured_image, Some(None));
        assert_eq!(request.meta_title, None);
        assert!(!request.is_empty());

        let empty: PostUpdateRequest = serde_json::from_str("{}").expect("parse");
        assert!(empty.is_empty());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Published".parse::<PostStatus>(), Ok(PostStatus::Published));
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn form_fields_tolerate_scalar_types() {
        let request: ContactRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","message":"Hi","phone":5551234,"company":{"x":1},"budget_range":null}"#,
        )
        .expect("parse");
        assert_eq!(request.name.as_deref(), Some("Ada"));
        assert_eq!(request.phone.as_deref(), Some("5551234"));
        assert_eq!(request.company, None);
        assert_eq!(request.budget_range, None);

        let chat: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","session_id":42}"#).expect("parse");
        assert_eq!(chat.message.as_deref(), Some("hi"));
        assert_eq!(chat.session_id.as_deref(), Some("42"));

        let missing: SubscribeRequest = serde_json::from_str("{}").expect("parse");
        assert_eq!(missing.email, None);
    }

    #[test]
    fn provenance_serializes_lowercase() {
        let value = serde_json::to_value(PostSource::N8n).expect("serialize");
        assert_eq!(value, serde_json::json!("n8n"));
    }
}
