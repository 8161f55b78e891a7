use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateSubscriberParams, RepoError, SubscribersRepo};
use crate::domain::entities::NewsletterSubscriberRecord;
use crate::domain::types::SubscriberStatus;

use super::{PostgresRepositories, map_sqlx_error};

const SUBSCRIBER_COLUMNS: &str =
    "id, email, name, status, subscribed_at, unsubscribed_at, source";

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i64,
    email: String,
    name: Option<String>,
    status: SubscriberStatus,
    subscribed_at: OffsetDateTime,
    unsubscribed_at: Option<OffsetDateTime>,
    source: String,
}

impl From<SubscriberRow> for NewsletterSubscriberRecord {
    fn from(row: SubscriberRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            status: row.status,
            subscribed_at: row.subscribed_at,
            unsubscribed_at: row.unsubscribed_at,
            source: row.source,
        }
    }
}

#[async_trait]
impl SubscribersRepo for PostgresRepositories {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriberRecord>, RepoError> {
        let sql = format!("SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers WHERE email = $1");
        let row = sqlx::query_as::<_, SubscriberRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(NewsletterSubscriberRecord::from))
    }

    async fn create_subscriber(
        &self,
        params: CreateSubscriberParams,
    ) -> Result<NewsletterSubscriberRecord, RepoError> {
        let sql = format!(
            "INSERT INTO newsletter_subscribers (email, name, source) VALUES ($1, $2, $3) \
             RETURNING {SUBSCRIBER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubscriberRow>(&sql)
            .bind(params.email)
            .bind(params.name)
            .bind(params.source)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn reactivate(&self, id: i64) -> Result<NewsletterSubscriberRecord, RepoError> {
        let sql = format!(
            "UPDATE newsletter_subscribers \
             SET status = $2, unsubscribed_at = NULL \
             WHERE id = $1 \
             RETURNING {SUBSCRIBER_COLUMNS}"
        );
        sqlx::query_as::<_, SubscriberRow>(&sql)
            .bind(id)
            .bind(SubscriberStatus::Active)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .map(NewsletterSubscriberRecord::from)
            .ok_or(RepoError::NotFound)
    }

    async fn list_by_status(
        &self,
        status: SubscriberStatus,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let sql = format!(
            "SELECT {SUBSCRIBER_COLUMNS} FROM newsletter_subscribers \
             WHERE status = $1 ORDER BY subscribed_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, SubscriberRow>(&sql)
            .bind(status)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_status(&self, status: SubscriberStatus) -> Result<i64, RepoError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_subscribers WHERE status = $1")
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
