use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::application::pagination::{OffsetPage, PageRequest};
use crate::application::repos::{
    AdjacentPosts, PostCounts, PostQueryFilter, PostsRepo, PublishedFilter, RepoError,
};
use crate::domain::entities::PostRecord;
use crate::domain::posts::CategoryCount;
use crate::domain::types::PostStatus;

use super::POST_COLUMNS;
use super::types::{CategoryRow, PostCountsRow, PostRow};
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

impl PostgresRepositories {
    fn apply_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostQueryFilter) {
        if let Some(status) = filter.status {
            qb.push(" AND p.status = ");
            qb.push_bind(status);
        }
        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND p.category = ");
            qb.push_bind(category.clone());
        }
    }

    fn apply_published_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PublishedFilter) {
        qb.push(" AND p.status = ");
        qb.push_bind(PostStatus::Published);
        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND p.category = ");
            qb.push_bind(category.clone());
        }
        if let Some(tag) = filter.tag.as_ref() {
            qb.push(" AND ");
            qb.push_bind(tag.clone());
            qb.push(" = ANY(p.tags)");
        }
    }

    fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));
    }

    async fn fetch_posts(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn fetch_optional_post(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
    ) -> Result<Option<PostRecord>, RepoError> {
        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }

    fn select_posts() -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts p WHERE 1=1 "))
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.id = ");
        qb.push_bind(id);
        self.fetch_optional_post(qb).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.slug = ");
        qb.push_bind(slug.to_string());
        self.fetch_optional_post(qb).await
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn count_slugs_with_prefix(&self, prefix: &str) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE starts_with(slug, $1)")
                .bind(prefix)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_post_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = Self::select_posts();
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
        Self::push_page(&mut qb, page);
        let items = self.fetch_posts(qb).await?;

        Ok(OffsetPage::new(items, Self::convert_count(total)?))
    }

    async fn list_published(
        &self,
        filter: &PublishedFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_published_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = Self::select_posts();
        Self::apply_published_filter(&mut qb, filter);
        qb.push(" ORDER BY p.published_at DESC NULLS LAST, p.id DESC ");
        Self::push_page(&mut qb, page);
        let items = self.fetch_posts(qb).await?;

        Ok(OffsetPage::new(items, Self::convert_count(total)?))
    }

    async fn published_category_counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT category, COUNT(*) AS count FROM posts \
             WHERE status = $1 GROUP BY category ORDER BY category",
        )
        .bind(PostStatus::Published)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| CategoryCount {
                category: row.category,
                count: row.count,
            })
            .collect())
    }

    async fn published_tag_lists(&self) -> Result<Vec<Vec<String>>, RepoError> {
        sqlx::query_scalar::<_, Vec<String>>(
            "SELECT tags FROM posts WHERE status = $1 ORDER BY id",
        )
        .bind(PostStatus::Published)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn adjacent_published(
        &self,
        published_at: OffsetDateTime,
    ) -> Result<AdjacentPosts, RepoError> {
        let mut previous = Self::select_posts();
        previous.push(" AND p.status = ");
        previous.push_bind(PostStatus::Published);
        previous.push(" AND p.published_at < ");
        previous.push_bind(published_at);
        previous.push(" ORDER BY p.published_at DESC, p.id DESC LIMIT 1");

        let mut next = Self::select_posts();
        next.push(" AND p.status = ");
        next.push_bind(PostStatus::Published);
        next.push(" AND p.published_at > ");
        next.push_bind(published_at);
        next.push(" ORDER BY p.published_at ASC, p.id ASC LIMIT 1");

        Ok(AdjacentPosts {
            previous: self.fetch_optional_post(previous).await?,
            next: self.fetch_optional_post(next).await?,
        })
    }

    async fn related_published(
        &self,
        category: &str,
        exclude_id: i64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.status = ");
        qb.push_bind(PostStatus::Published);
        qb.push(" AND p.category = ");
        qb.push_bind(category.to_string());
        qb.push(" AND p.id <> ");
        qb.push_bind(exclude_id);
        qb.push(" ORDER BY p.published_at DESC NULLS LAST, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        self.fetch_posts(qb).await
    }

    async fn recent_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = Self::select_posts();
        qb.push(" AND p.status = ");
        qb.push_bind(PostStatus::Published);
        qb.push(" ORDER BY p.published_at DESC NULLS LAST, p.id DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }
        self.fetch_posts(qb).await
    }

    async fn post_counts(&self) -> Result<PostCounts, RepoError> {
        let row = sqlx::query_as::<_, PostCountsRow>(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE status = 'published') AS published, \
                    COUNT(*) FILTER (WHERE status = 'draft') AS drafts, \
                    COUNT(*) FILTER (WHERE status = 'scheduled') AS scheduled, \
                    COALESCE(SUM(views), 0)::BIGINT AS total_views \
             FROM posts",
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostCounts {
            total: row.total,
            published: row.published,
            drafts: row.drafts,
            scheduled: row.scheduled,
            total_views: row.total_views,
        })
    }
}
