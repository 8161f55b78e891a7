#![allow(dead_code)]

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use duodriven::application::blog::BlogService;
use duodriven::application::chat::ChatService;
use duodriven::application::contact::ContactService;
use duodriven::application::gateways::{ChatGateway, ContactForwarder};
use duodriven::application::newsletter::NewsletterService;
use duodriven::application::pagination::{OffsetPage, PageRequest};
use duodriven::application::posts::PostService;
use duodriven::application::render::markdown_renderer;
use duodriven::application::repos::{
    AdjacentPosts, ContactCounts, ContactsRepo, CreateContactParams, CreatePostParams,
    CreateSubscriberParams, HealthRepo, PostCounts, PostQueryFilter, PostsRepo, PostsWriteRepo,
    PublishedFilter, RepoError, SubscribersRepo, UpdatePostParams,
};
use duodriven::application::sitemap::SitemapService;
use duodriven::application::stats::StatsService;
use duodriven::application::syndication::SyndicationService;
use duodriven::domain::entities::{ContactSubmissionRecord, NewsletterSubscriberRecord, PostRecord};
use duodriven::domain::posts::{CategoryCount, Publication};
use duodriven::domain::types::{ContactStatus, PostStatus, SubscriberStatus};
use duodriven::infra::http::{ApiRateLimiter, ApiState, HttpState, RouterState};

pub const API_KEY: &str = "test-api-key";
pub const PUBLIC_URL: &str = "https://duodriven.test";

/// In-memory stand-in for the Postgres repositories.
#[derive(Default)]
pub struct InMemoryStore {
    posts: Mutex<Vec<PostRecord>>,
    subscribers: Mutex<Vec<NewsletterSubscriberRecord>>,
    contacts: Mutex<Vec<ContactSubmissionRecord>>,
    next_id: Mutex<i64>,
    pub fail_contacts: bool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store whose contact inserts always fail.
    pub fn with_failing_contacts() -> Arc<Self> {
        Arc::new(Self {
            fail_contacts: true,
            ..Self::default()
        })
    }

    async fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.lock().await;
        *next += 1;
        *next
    }

    pub async fn posts(&self) -> Vec<PostRecord> {
        self.posts.lock().await.clone()
    }

    pub async fn contacts(&self) -> Vec<ContactSubmissionRecord> {
        self.contacts.lock().await.clone()
    }

    pub async fn subscribers(&self) -> Vec<NewsletterSubscriberRecord> {
        self.subscribers.lock().await.clone()
    }

    /// Insert a post directly, bypassing the service rules.
    pub async fn seed_post(&self, post: PostRecord) -> PostRecord {
        let mut post = post;
        post.id = self.allocate_id().await;
        self.posts.lock().await.push(post.clone());
        post
    }

    pub async fn seed_subscriber(&self, email: &str, status: SubscriberStatus) -> i64 {
        let id = self.allocate_id().await;
        self.subscribers
            .lock()
            .await
            .push(NewsletterSubscriberRecord {
                id,
                email: email.to_string(),
                name: None,
                status,
                subscribed_at: OffsetDateTime::now_utc(),
                unsubscribed_at: (status == SubscriberStatus::Unsubscribed)
                    .then(OffsetDateTime::now_utc),
                source: "website".to_string(),
            });
        id
    }
}

/// Minimal published post used as seed data.
pub fn published_post(slug: &str, published_at: OffsetDateTime) -> PostRecord {
    PostRecord {
        id: 0,
        title: slug.replace('-', " "),
        slug: slug.to_string(),
        excerpt: format!("About {slug}"),
        content: format!("# {slug}\n\nBody text."),
        featured_image: None,
        meta_title: None,
        meta_description: None,
        category: "digital-marketing".to_string(),
        tags: Vec::new(),
        status: PostStatus::Published,
        published_at: Some(published_at),
        scheduled_for: None,
        author: "DUODRIVEN Team".to_string(),
        read_time: 1,
        views: 0,
        source: duodriven::domain::types::PostSource::Manual,
        external_id: None,
        created_at: published_at,
        updated_at: published_at,
    }
}

fn published_order(post: &PostRecord) -> (bool, Reverse<Option<OffsetDateTime>>, Reverse<i64>) {
    (
        post.published_at.is_none(),
        Reverse(post.published_at),
        Reverse(post.id),
    )
}

fn page_of(mut items: Vec<PostRecord>, page: PageRequest) -> OffsetPage<PostRecord> {
    let total = items.len() as u64;
    let start = (page.offset as usize).min(items.len());
    let mut items = items.split_off(start);
    items.truncate(page.limit as usize);
    OffsetPage::new(items, total)
}

fn published(posts: &[PostRecord]) -> Vec<PostRecord> {
    let mut items: Vec<PostRecord> = posts
        .iter()
        .filter(|post| post.status == PostStatus::Published)
        .cloned()
        .collect();
    items.sort_by_key(published_order);
    items
}

#[async_trait]
impl PostsRepo for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.posts.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != exclude_id))
    }

    async fn count_slugs_with_prefix(&self, prefix: &str) -> Result<u64, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .filter(|p| p.slug.starts_with(prefix))
            .count() as u64)
    }

    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError> {
        let mut items: Vec<PostRecord> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|p| filter.status.is_none_or(|status| p.status == status))
            .filter(|p| filter.category.as_ref().is_none_or(|c| &p.category == c))
            .cloned()
            .collect();
        items.sort_by_key(|p| (Reverse(p.created_at), Reverse(p.id)));
        Ok(page_of(items, page))
    }

    async fn list_published(
        &self,
        filter: &PublishedFilter,
        page: PageRequest,
    ) -> Result<OffsetPage<PostRecord>, RepoError> {
        let items: Vec<PostRecord> = published(&self.posts.lock().await)
            .into_iter()
            .filter(|p| filter.category.as_ref().is_none_or(|c| &p.category == c))
            .filter(|p| filter.tag.as_ref().is_none_or(|t| p.tags.contains(t)))
            .collect();
        Ok(page_of(items, page))
    }

    async fn published_category_counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let mut counts: Vec<CategoryCount> = Vec::new();
        for post in published(&self.posts.lock().await) {
            match counts.iter_mut().find(|c| c.category == post.category) {
                Some(entry) => entry.count += 1,
                None => counts.push(CategoryCount {
                    category: post.category.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| a.category.cmp(&b.category));
        Ok(counts)
    }

    async fn published_tag_lists(&self) -> Result<Vec<Vec<String>>, RepoError> {
        let mut items = published(&self.posts.lock().await);
        items.sort_by_key(|p| p.id);
        Ok(items.into_iter().map(|p| p.tags).collect())
    }

    async fn adjacent_published(
        &self,
        published_at: OffsetDateTime,
    ) -> Result<AdjacentPosts, RepoError> {
        let items = published(&self.posts.lock().await);
        let previous = items
            .iter()
            .find(|p| p.published_at.is_some_and(|at| at < published_at))
            .cloned();
        let next = items
            .iter()
            .rev()
            .find(|p| p.published_at.is_some_and(|at| at > published_at))
            .cloned();
        Ok(AdjacentPosts { previous, next })
    }

    async fn related_published(
        &self,
        category: &str,
        exclude_id: i64,
        limit: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(published(&self.posts.lock().await)
            .into_iter()
            .filter(|p| p.category == category && p.id != exclude_id)
            .take(limit as usize)
            .collect())
    }

    async fn recent_published(&self, limit: Option<u32>) -> Result<Vec<PostRecord>, RepoError> {
        let items = published(&self.posts.lock().await);
        Ok(match limit {
            Some(limit) => items.into_iter().take(limit as usize).collect(),
            None => items,
        })
    }

    async fn post_counts(&self) -> Result<PostCounts, RepoError> {
        let posts = self.posts.lock().await;
        let count = |status: PostStatus| posts.iter().filter(|p| p.status == status).count() as i64;
        Ok(PostCounts {
            total: posts.len() as i64,
            published: count(PostStatus::Published),
            drafts: count(PostStatus::Draft),
            scheduled: count(PostStatus::Scheduled),
            total_views: posts.iter().map(|p| p.views).sum(),
        })
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        if self.slug_exists(&params.slug, None).await? {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: self.allocate_id().await,
            title: params.title,
            slug: params.slug,
            excerpt: params.excerpt,
            content: params.content,
            featured_image: params.featured_image,
            meta_title: params.meta_title,
            meta_description: params.meta_description,
            category: params.category,
            tags: params.tags,
            status: params.status,
            published_at: params.published_at,
            scheduled_for: params.scheduled_for,
            author: params.author,
            read_time: params.read_time,
            views: 0,
            source: params.source,
            external_id: params.external_id,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().await.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        if self.slug_exists(&params.slug, Some(params.id)).await? {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.slug = params.slug;
        post.excerpt = params.excerpt;
        post.content = params.content;
        post.featured_image = params.featured_image;
        post.meta_title = params.meta_title;
        post.meta_description = params.meta_description;
        post.category = params.category;
        post.tags = params.tags;
        post.status = params.status;
        post.published_at = params.published_at;
        post.scheduled_for = params.scheduled_for;
        post.author = params.author;
        post.read_time = params.read_time;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<bool, RepoError> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }

    async fn publish_due(&self, now: OffsetDateTime) -> Result<Vec<i64>, RepoError> {
        let mut posts = self.posts.lock().await;
        let mut ids = Vec::new();
        for post in posts.iter_mut() {
            let publication = Publication {
                status: post.status,
                published_at: post.published_at,
                scheduled_for: post.scheduled_for,
            };
            if publication.is_due(now) {
                post.status = PostStatus::Published;
                post.published_at = post.published_at.or(Some(now));
                post.scheduled_for = None;
                post.updated_at = now;
                ids.push(post.id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn increment_views(&self, id: i64) -> Result<i64, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(post.views)
    }
}

#[async_trait]
impl SubscribersRepo for InMemoryStore {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<NewsletterSubscriberRecord>, RepoError> {
        Ok(self
            .subscribers
            .lock()
            .await
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn create_subscriber(
        &self,
        params: CreateSubscriberParams,
    ) -> Result<NewsletterSubscriberRecord, RepoError> {
        if self.find_by_email(&params.email).await?.is_some() {
            return Err(RepoError::Duplicate {
                constraint: "newsletter_subscribers_email_key".to_string(),
            });
        }
        let record = NewsletterSubscriberRecord {
            id: self.allocate_id().await,
            email: params.email,
            name: params.name,
            status: SubscriberStatus::Active,
            subscribed_at: OffsetDateTime::now_utc(),
            unsubscribed_at: None,
            source: params.source,
        };
        self.subscribers.lock().await.push(record.clone());
        Ok(record)
    }

    async fn reactivate(&self, id: i64) -> Result<NewsletterSubscriberRecord, RepoError> {
        let mut subscribers = self.subscribers.lock().await;
        let record = subscribers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepoError::NotFound)?;
        record.status = SubscriberStatus::Active;
        record.unsubscribed_at = None;
        Ok(record.clone())
    }

    async fn list_by_status(
        &self,
        status: SubscriberStatus,
    ) -> Result<Vec<NewsletterSubscriberRecord>, RepoError> {
        let mut items: Vec<NewsletterSubscriberRecord> = self
            .subscribers
            .lock()
            .await
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect();
        items.sort_by_key(|s| (Reverse(s.subscribed_at), Reverse(s.id)));
        Ok(items)
    }

    async fn count_by_status(&self, status: SubscriberStatus) -> Result<i64, RepoError> {
        Ok(self.list_by_status(status).await?.len() as i64)
    }
}

#[async_trait]
impl ContactsRepo for InMemoryStore {
    async fn create_submission(
        &self,
        params: CreateContactParams,
    ) -> Result<ContactSubmissionRecord, RepoError> {
        if self.fail_contacts {
            return Err(RepoError::from_persistence("contacts table unavailable"));
        }
        let now = OffsetDateTime::now_utc();
        let record = ContactSubmissionRecord {
            id: self.allocate_id().await,
            name: params.name,
            email: params.email,
            company: params.company,
            phone: params.phone,
            message: params.message,
            service_interest: params.service_interest,
            budget_range: params.budget_range,
            status: ContactStatus::New,
            notes: None,
            source: "website".to_string(),
            utm_source: params.utm_source,
            utm_medium: params.utm_medium,
            utm_campaign: params.utm_campaign,
            created_at: now,
            updated_at: now,
        };
        self.contacts.lock().await.push(record.clone());
        Ok(record)
    }

    async fn contact_counts(&self) -> Result<ContactCounts, RepoError> {
        let contacts = self.contacts.lock().await;
        Ok(ContactCounts {
            total: contacts.len() as i64,
            new: contacts
                .iter()
                .filter(|c| c.status == ContactStatus::New)
                .count() as i64,
        })
    }
}

#[async_trait]
impl HealthRepo for InMemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Knobs for assembling a router over an [`InMemoryStore`].
pub struct TestApp {
    pub api_key: Option<&'static str>,
    pub chat: Option<Arc<dyn ChatGateway>>,
    pub forwarder: Option<Arc<dyn ContactForwarder>>,
    pub rate_limit: u32,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            api_key: Some(API_KEY),
            chat: None,
            forwarder: None,
            rate_limit: 1_000,
        }
    }
}

impl TestApp {
    pub fn state(self, store: Arc<InMemoryStore>) -> RouterState {
        let posts_reader: Arc<dyn PostsRepo> = store.clone();
        let posts_writer: Arc<dyn PostsWriteRepo> = store.clone();
        let subscribers: Arc<dyn SubscribersRepo> = store.clone();
        let contacts: Arc<dyn ContactsRepo> = store.clone();
        let health: Arc<dyn HealthRepo> = store;

        let newsletter = Arc::new(NewsletterService::new(subscribers.clone()));
        let http = HttpState {
            blog: Arc::new(BlogService::new(
                posts_reader.clone(),
                posts_writer.clone(),
                markdown_renderer(),
            )),
            syndication: Arc::new(SyndicationService::new(posts_reader.clone(), PUBLIC_URL)),
            sitemap: Arc::new(SitemapService::new(posts_reader.clone(), PUBLIC_URL)),
            chat: Arc::new(ChatService::new(self.chat)),
            contact: Arc::new(ContactService::new(contacts.clone(), self.forwarder)),
            newsletter: newsletter.clone(),
            health,
            public_url: Arc::from(PUBLIC_URL),
        };
        let api = ApiState {
            api_key: self.api_key.map(Arc::from),
            posts: Arc::new(PostService::new(posts_reader.clone(), posts_writer)),
            newsletter,
            stats: Arc::new(StatsService::new(posts_reader, subscribers, contacts)),
            rate_limiter: Arc::new(ApiRateLimiter::new(
                Duration::from_secs(60),
                self.rate_limit,
            )),
        };
        RouterState { http, api }
    }

    pub fn router(self, store: Arc<InMemoryStore>) -> axum::Router {
        duodriven::infra::http::build_router(self.state(store))
    }
}

pub fn post_service(store: &Arc<InMemoryStore>) -> PostService {
    PostService::new(store.clone(), store.clone())
}

pub fn blog_service(store: &Arc<InMemoryStore>) -> BlogService {
    BlogService::new(store.clone(), store.clone(), markdown_renderer())
}
