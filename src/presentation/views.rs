use crate::application::blog::{BlogIndex, PostDetail};
use crate::application::error::{ErrorReport, HttpError};
use crate::application::syndication::normalize_public_site_url;
use crate::domain::entities::PostRecord;
use crate::domain::posts::{CategoryCount, TagCount, format_human_date, format_rfc3339};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

const SITE_NAME: &str = "DUODRIVEN";
const DEFAULT_DESCRIPTION: &str = "DUODRIVEN builds growth engines: performance marketing, marketing automation and the engineering that ties them together.";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome.with_title("Page Not Found"), content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: &'static str,
    pub href: &'static str,
    pub is_active: bool,
}

const NAVIGATION: &[(&str, &str)] = &[
    ("Services", "/services"),
    ("Case Studies", "/case-studies"),
    ("Technology", "/technology"),
    ("About", "/about"),
    ("Blog", "/blog"),
    ("Contact", "/contact"),
];

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub og_image: Option<String>,
}

/// Shared page furniture: navigation, footer year and head metadata.
#[derive(Clone)]
pub struct LayoutChrome {
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
    pub year: i32,
}

impl LayoutChrome {
    pub fn for_path(public_url: &str, path: &str) -> Self {
        let navigation = NAVIGATION
            .iter()
            .map(|&(label, href)| NavigationLinkView {
                label,
                href,
                is_active: path == href || path.starts_with(&format!("{href}/")),
            })
            .collect();

        Self {
            navigation,
            meta: PageMetaView {
                title: SITE_NAME.to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
                canonical: canonical_url(public_url, path),
                og_image: None,
            },
            year: time::OffsetDateTime::now_utc().year(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.meta.title = format!("{title} | {SITE_NAME}");
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        let trimmed = description.trim();
        if !trimmed.is_empty() {
            self.meta.description = trimmed.to_string();
        }
        self
    }

    pub fn with_og_image(mut self, image: Option<String>) -> Self {
        self.meta.og_image = image;
        self
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub navigation: Vec<NavigationLinkView>,
    pub meta: PageMetaView,
    pub year: i32,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            navigation: chrome.navigation,
            meta: chrome.meta,
            year: chrome.year,
            content,
        }
    }
}

/// Content of a static marketing page; the template carries the copy.
#[derive(Clone, Default)]
pub struct MarketingView;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Template)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Template)]
#[template(path = "case_studies.html")]
pub struct CaseStudiesTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Template)]
#[template(path = "technology.html")]
pub struct TechnologyTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub view: LayoutContext<MarketingView>,
}

#[derive(Clone)]
pub struct TagBadge {
    pub value: String,
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub category_label: String,
    pub category_href: String,
    pub iso_date: String,
    pub published: String,
    pub read_time: i32,
    pub featured_image: Option<String>,
    pub badges: Vec<TagBadge>,
}

impl From<&PostRecord> for PostCard {
    fn from(post: &PostRecord) -> Self {
        let when = post.published_at.unwrap_or(post.created_at);
        Self {
            href: post.url(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            category_label: title_case(&post.category),
            category_href: filter_href("category", &post.category),
            iso_date: format_rfc3339(when),
            published: format_human_date(when),
            read_time: post.read_time,
            featured_image: post.featured_image.clone(),
            badges: build_tag_badges(&post.tags),
        }
    }
}

#[derive(Clone)]
pub struct CategorySummary {
    pub label: String,
    pub href: String,
    pub count: i64,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct TagSummary {
    pub label: String,
    pub href: String,
    pub count: usize,
    pub is_active: bool,
}

pub struct BlogIndexView {
    pub posts: Vec<PostCard>,
    pub has_results: bool,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub categories: Vec<CategorySummary>,
    pub tags: Vec<TagSummary>,
    pub active_filter: Option<String>,
}

impl From<BlogIndex> for BlogIndexView {
    fn from(index: BlogIndex) -> Self {
        let filter_query = match (&index.current_category, &index.current_tag) {
            (Some(category), _) => format!("&category={}", encode_query(category)),
            (None, Some(tag)) => format!("&tag={}", encode_query(tag)),
            (None, None) => String::new(),
        };
        let page_href = |page: u64| format!("/blog?page={page}{filter_query}");

        let previous_href = index.has_previous().then(|| page_href(index.page - 1));
        let next_href = index.has_next().then(|| page_href(index.page + 1));

        let categories = category_summaries(&index.categories, index.current_category.as_deref());
        let tags = tag_summaries(&index.popular_tags, index.current_tag.as_deref());
        let active_filter = index
            .current_category
            .as_deref()
            .map(title_case)
            .or_else(|| index.current_tag.as_ref().map(|tag| format!("#{tag}")));

        Self {
            has_results: !index.posts.is_empty(),
            posts: index.posts.iter().map(PostCard::from).collect(),
            total: index.total,
            page: index.page,
            total_pages: index.total_pages,
            previous_href,
            next_href,
            categories,
            tags,
            active_filter,
        }
    }
}

#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub view: LayoutContext<BlogIndexView>,
}

#[derive(Clone)]
pub struct PostLink {
    pub href: String,
    pub title: String,
}

impl From<&PostRecord> for PostLink {
    fn from(post: &PostRecord) -> Self {
        Self {
            href: post.url(),
            title: post.title.clone(),
        }
    }
}

pub struct PostDetailView {
    pub title: String,
    pub excerpt: String,
    pub content_html: String,
    pub author: String,
    pub category_label: String,
    pub category_href: String,
    pub published: Option<String>,
    pub iso_date: Option<String>,
    pub read_time: i32,
    pub views: i64,
    pub featured_image: Option<String>,
    pub badges: Vec<TagBadge>,
    pub is_preview: bool,
    pub status: String,
    pub previous: Option<PostLink>,
    pub next: Option<PostLink>,
    pub related: Vec<PostCard>,
}

impl From<PostDetail> for PostDetailView {
    fn from(detail: PostDetail) -> Self {
        let PostDetail {
            post,
            html,
            previous,
            next,
            related,
        } = detail;

        Self {
            is_preview: !post.is_published(),
            status: post.status.to_string(),
            published: post.published_at.map(format_human_date),
            iso_date: post.published_at.map(format_rfc3339),
            category_label: title_case(&post.category),
            category_href: filter_href("category", &post.category),
            badges: build_tag_badges(&post.tags),
            content_html: html,
            previous: previous.as_ref().map(PostLink::from),
            next: next.as_ref().map(PostLink::from),
            related: related.iter().map(PostCard::from).collect(),
            title: post.title,
            excerpt: post.excerpt,
            author: post.author,
            read_time: post.read_time,
            views: post.views,
            featured_image: post.featured_image,
        }
    }
}

#[derive(Template)]
#[template(path = "blog/post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist. Try the blog or head back to the homepage.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn build_tag_badges(tags: &[String]) -> Vec<TagBadge> {
    tags.iter()
        .map(|tag| TagBadge {
            value: tag.clone(),
            label: format!("#{tag}"),
            href: filter_href("tag", tag),
        })
        .collect()
}

fn category_summaries(counts: &[CategoryCount], active: Option<&str>) -> Vec<CategorySummary> {
    counts
        .iter()
        .map(|entry| CategorySummary {
            label: title_case(&entry.category),
            href: filter_href("category", &entry.category),
            count: entry.count,
            is_active: active == Some(entry.category.as_str()),
        })
        .collect()
}

fn tag_summaries(tags: &[TagCount], active: Option<&str>) -> Vec<TagSummary> {
    tags.iter()
        .map(|entry| TagSummary {
            label: format!("#{}", entry.tag),
            href: filter_href("tag", &entry.tag),
            count: entry.count,
            is_active: active == Some(entry.tag.as_str()),
        })
        .collect()
}

fn filter_href(key: &str, value: &str) -> String {
    format!("/blog?{key}={}", encode_query(value))
}

pub fn encode_query(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub fn canonical_url(base: &str, path: &str) -> String {
    let root = normalize_public_site_url(base);
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        root
    } else {
        format!("{root}{trimmed}")
    }
}

pub fn title_case(tag: &str) -> String {
    if tag.eq_ignore_ascii_case("ai") {
        return "AI".to_string();
    }

    let mut words = Vec::new();
    for segment in tag.split(['-', '_']) {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            let mut word = String::new();
            word.extend(first.to_uppercase());
            for ch in chars {
                word.extend(ch.to_lowercase());
            }
            words.push(word);
        }
    }

    if words.is_empty() {
        tag.to_string()
    } else {
        words.join(" ")
    }
}
