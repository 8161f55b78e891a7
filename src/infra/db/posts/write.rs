use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::domain::types::PostStatus;

use super::POST_COLUMNS;
use super::types::PostRow;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            slug,
            excerpt,
            content,
            featured_image,
            meta_title,
            meta_description,
            category,
            tags,
            status,
            published_at,
            scheduled_for,
            author,
            read_time,
            source,
            external_id,
        } = params;

        let sql = format!(
            "INSERT INTO posts AS p (\
                title, slug, excerpt, content, featured_image, meta_title, meta_description, \
                category, tags, status, published_at, scheduled_for, author, read_time, \
                source, external_id\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {POST_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(title)
            .bind(slug)
            .bind(excerpt)
            .bind(content)
            .bind(featured_image)
            .bind(meta_title)
            .bind(meta_description)
            .bind(category)
            .bind(tags)
            .bind(status)
            .bind(published_at)
            .bind(scheduled_for)
            .bind(author)
            .bind(read_time)
            .bind(source)
            .bind(external_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            slug,
            excerpt,
            content,
            featured_image,
            meta_title,
            meta_description,
            category,
            tags,
            status,
            published_at,
            scheduled_for,
            author,
            read_time,
        } = params;

        let sql = format!(
            "UPDATE posts AS p SET \
                title = $2, slug = $3, excerpt = $4, content = $5, featured_image = $6, \
                meta_title = $7, meta_description = $8, category = $9, tags = $10, \
                status = $11, published_at = $12, scheduled_for = $13, author = $14, \
                read_time = $15, updated_at = now() \
             WHERE p.id = $1 \
             RETURNING {POST_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(slug)
            .bind(excerpt)
            .bind(content)
            .bind(featured_image)
            .bind(meta_title)
            .bind(meta_description)
            .bind(category)
            .bind(tags)
            .bind(status)
            .bind(published_at)
            .bind(scheduled_for)
            .bind(author)
            .bind(read_time)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<i64>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Rows already locked by a concurrent sweep are left to that sweep.
        let mut ids: Vec<i64> = sqlx::query_scalar(
            "WITH due AS (\
                SELECT id FROM posts \
                WHERE status = $1 AND scheduled_for <= $2 \
                FOR UPDATE SKIP LOCKED\
             ) \
             UPDATE posts AS p SET \
                status = $3, \
                published_at = COALESCE(p.published_at, $2), \
                scheduled_for = NULL, \
                updated_at = $2 \
             FROM due WHERE p.id = due.id \
             RETURNING p.id",
        )
        .bind(PostStatus::Scheduled)
        .bind(now)
        .bind(PostStatus::Published)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        ids.sort_unstable();
        Ok(ids)
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)
    }
}
