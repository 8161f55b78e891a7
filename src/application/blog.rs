//! Read path of the public blog.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;

use crate::application::pagination::{BLOG_PAGE_SIZE, PageRequest, page_count};
use crate::application::render::MarkdownRenderer;
use crate::application::repos::{PostsRepo, PostsWriteRepo, PublishedFilter, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::posts::{CategoryCount, TagCount, popular_tags};

const METRIC_POST_VIEWS: &str = "duodriven_post_views_total";
const POPULAR_TAG_LIMIT: usize = 10;
const RELATED_POST_LIMIT: u32 = 3;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct BlogIndexQuery {
    pub page: Option<i64>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlogIndex {
    pub posts: Vec<PostRecord>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub categories: Vec<CategoryCount>,
    pub popular_tags: Vec<TagCount>,
    pub current_category: Option<String>,
    pub current_tag: Option<String>,
}

impl BlogIndex {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub html: String,
    pub previous: Option<PostRecord>,
    pub next: Option<PostRecord>,
    pub related: Vec<PostRecord>,
}

#[derive(Clone)]
pub struct BlogService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    renderer: Arc<MarkdownRenderer>,
}

impl BlogService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            reader,
            writer,
            renderer,
        }
    }

    pub async fn index(&self, query: BlogIndexQuery) -> Result<BlogIndex, BlogError> {
        let current_category = non_empty(query.category);
        let current_tag = non_empty(query.tag);
        let request = PageRequest::for_page(query.page.unwrap_or(1), BLOG_PAGE_SIZE);
        let page = request.offset / u64::from(BLOG_PAGE_SIZE) + 1;

        let filter = PublishedFilter {
            category: current_category.clone(),
            tag: current_tag.clone(),
        };
        let listing = self.reader.list_published(&filter, request).await?;
        let categories = self.reader.published_category_counts().await?;
        let tag_lists = self.reader.published_tag_lists().await?;
        let popular = popular_tags(tag_lists.iter().map(Vec::as_slice), POPULAR_TAG_LIMIT);

        Ok(BlogIndex {
            total_pages: page_count(listing.total, BLOG_PAGE_SIZE),
            total: listing.total,
            posts: listing.items,
            page,
            categories,
            popular_tags: popular,
            current_category,
            current_tag,
        })
    }

    /// Load a post for display and record the visit.
    ///
    /// Unpublished posts are visible only when `preview` is set.
    pub async fn view(&self, slug: &str, preview: bool) -> Result<PostDetail, BlogError> {
        let mut post = self
            .reader
            .find_by_slug(slug)
            .await?
            .filter(|post| preview || post.is_published())
            .ok_or(BlogError::NotFound)?;

        post.views = self
            .writer
            .increment_views(post.id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => BlogError::NotFound,
                other => BlogError::Repo(other),
            })?;
        counter!(METRIC_POST_VIEWS).increment(1);

        let html = self.renderer.render(&post.content);
        let adjacent = match post.published_at {
            Some(published_at) => self.reader.adjacent_published(published_at).await?,
            None => Default::default(),
        };
        let related = self
            .reader
            .related_published(&post.category, post.id, RELATED_POST_LIMIT)
            .await?;

        Ok(PostDetail {
            post,
            html,
            previous: adjacent.previous,
            next: adjacent.next,
            related,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
