use time::OffsetDateTime;

use crate::domain::entities::PostRecord;
use crate::domain::types::{PostSource, PostStatus};

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) excerpt: String,
    pub(crate) content: String,
    pub(crate) featured_image: Option<String>,
    pub(crate) meta_title: Option<String>,
    pub(crate) meta_description: Option<String>,
    pub(crate) category: String,
    pub(crate) tags: Vec<String>,
    pub(crate) status: PostStatus,
    pub(crate) published_at: Option<OffsetDateTime>,
    pub(crate) scheduled_for: Option<OffsetDateTime>,
    pub(crate) author: String,
    pub(crate) read_time: i32,
    pub(crate) views: i64,
    pub(crate) source: PostSource,
    pub(crate) external_id: Option<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            featured_image: row.featured_image,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            category: row.category,
            tags: row.tags,
            status: row.status,
            published_at: row.published_at,
            scheduled_for: row.scheduled_for,
            author: row.author,
            read_time: row.read_time,
            views: row.views,
            source: row.source,
            external_id: row.external_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) category: String,
    pub(crate) count: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostCountsRow {
    pub(crate) total: i64,
    pub(crate) published: i64,
    pub(crate) drafts: i64,
    pub(crate) scheduled: i64,
    pub(crate) total_views: i64,
}
