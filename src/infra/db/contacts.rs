use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    ContactCounts, ContactsRepo, CreateContactParams, RepoError,
};
use crate::domain::entities::ContactSubmissionRecord;
use crate::domain::types::ContactStatus;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    name: String,
    email: String,
    company: Option<String>,
    phone: Option<String>,
    message: String,
    service_interest: Option<String>,
    budget_range: Option<String>,
    status: ContactStatus,
    notes: Option<String>,
    source: String,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ContactRow> for ContactSubmissionRecord {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            company: row.company,
            phone: row.phone,
            message: row.message,
            service_interest: row.service_interest,
            budget_range: row.budget_range,
            status: row.status,
            notes: row.notes,
            source: row.source,
            utm_source: row.utm_source,
            utm_medium: row.utm_medium,
            utm_campaign: row.utm_campaign,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContactCountsRow {
    total: i64,
    new: i64,
}

#[async_trait]
impl ContactsRepo for PostgresRepositories {
    async fn create_submission(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactSubmissionRecord, RepoError> {
        let row = sqlx::query_as::<_, ContactRow>(
            "INSERT INTO contact_submissions (\
                name, email, company, phone, message, service_interest, budget_range, \
                utm_source, utm_medium, utm_campaign\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, name, email, company, phone, message, service_interest, \
                budget_range, status, notes, source, utm_source, utm_medium, utm_campaign, \
                created_at, updated_at",
        )
        .bind(params.name)
        .bind(params.email)
        .bind(params.company)
        .bind(params.phone)
        .bind(params.message)
        .bind(params.service_interest)
        .bind(params.budget_range)
        .bind(params.utm_source)
        .bind(params.utm_medium)
        .bind(params.utm_campaign)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn contact_counts(&self) -> Result<ContactCounts, RepoError> {
        let row = sqlx::query_as::<_, ContactCountsRow>(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE status = 'new') AS new \
             FROM contact_submissions",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ContactCounts {
            total: row.total,
            new: row.new,
        })
    }
}
