use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        blog::{BlogError, BlogIndexQuery, BlogService},
        chat::ChatService,
        contact::ContactService,
        error::HttpError,
        newsletter::NewsletterService,
        repos::HealthRepo,
        sitemap::SitemapService,
        syndication::SyndicationService,
    },
    presentation::views::{
        AboutTemplate, BlogIndexTemplate, BlogIndexView, CaseStudiesTemplate, ContactTemplate,
        IndexTemplate, LayoutChrome, LayoutContext, MarketingView, PostDetailView, PostTemplate,
        ServicesTemplate, TechnologyTemplate, encode_query, render_not_found_response,
        render_template_response,
    },
};

use super::RouterState;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub syndication: Arc<SyndicationService>,
    pub sitemap: Arc<SitemapService>,
    pub chat: Arc<ChatService>,
    pub contact: Arc<ContactService>,
    pub newsletter: Arc<NewsletterService>,
    pub health: Arc<dyn HealthRepo>,
    pub public_url: Arc<str>,
}

impl HttpState {
    fn chrome(&self, path: &str) -> LayoutChrome {
        LayoutChrome::for_path(&self.public_url, path)
    }
}

/// Marketing pages, the blog reader and embedded assets.
pub fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/services", get(services))
        .route("/case-studies", get(case_studies))
        .route("/technology", get(technology))
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/blog", get(blog_index))
        .route("/blog/", get(blog_index))
        .route("/blog/feed.xml", get(rss_feed))
        .route("/blog/sitemap.xml", get(sitemap))
        .route("/blog/category/{category}", get(category_redirect))
        .route("/blog/tag/{tag}", get(tag_redirect))
        .route("/blog/{slug}", get(post_detail))
        .route("/static/{*path}", get(crate::infra::assets::serve_static))
}

async fn index(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

async fn services(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/services").with_title("Services");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(ServicesTemplate { view }, StatusCode::OK)
}

async fn case_studies(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/case-studies").with_title("Case Studies");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(CaseStudiesTemplate { view }, StatusCode::OK)
}

async fn technology(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/technology").with_title("Technology");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(TechnologyTemplate { view }, StatusCode::OK)
}

async fn about(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/about").with_title("About");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(AboutTemplate { view }, StatusCode::OK)
}

async fn contact(State(state): State<HttpState>) -> Response {
    let chrome = state.chrome("/contact").with_title("Contact");
    let view = LayoutContext::new(chrome, MarketingView);
    render_template_response(ContactTemplate { view }, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BlogQuery {
    page: Option<String>,
    category: Option<String>,
    tag: Option<String>,
}

async fn blog_index(State(state): State<HttpState>, Query(query): Query<BlogQuery>) -> Response {
    // Unparseable page numbers fall back to the first page.
    let page = query
        .page
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    let index = match state
        .blog
        .index(BlogIndexQuery {
            page,
            category: query.category,
            tag: query.tag,
        })
        .await
    {
        Ok(index) => index,
        Err(err) => return blog_error_response(&state, "/blog", err),
    };

    let chrome = state.chrome("/blog").with_title("Blog");
    let view = LayoutContext::new(chrome, BlogIndexView::from(index));
    render_template_response(BlogIndexTemplate { view }, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreviewQuery {
    preview: Option<String>,
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let path = format!("/blog/{slug}");
    let preview = query
        .preview
        .as_deref()
        .is_some_and(|value| !value.is_empty());

    let detail = match state.blog.view(&slug, preview).await {
        Ok(detail) => detail,
        Err(err) => return blog_error_response(&state, &path, err),
    };

    let post = &detail.post;
    let chrome = state
        .chrome(&path)
        .with_title(post.meta_title.as_deref().unwrap_or(&post.title))
        .with_description(
            post.meta_description
                .as_deref()
                .unwrap_or(post.excerpt.as_str()),
        )
        .with_og_image(post.featured_image.clone());
    let view = LayoutContext::new(chrome, PostDetailView::from(detail));
    render_template_response(PostTemplate { view }, StatusCode::OK)
}

async fn category_redirect(Path(category): Path<String>) -> Redirect {
    Redirect::to(&format!("/blog?category={}", encode_query(&category)))
}

async fn tag_redirect(Path(tag): Path<String>) -> Redirect {
    Redirect::to(&format!("/blog?tag={}", encode_query(&tag)))
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    match state.syndication.rss_feed().await {
        Ok(body) => xml_response(body),
        Err(err) => HttpError::from_error(
            "infra::http::public::rss",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate RSS feed",
            &err,
        )
        .into_response(),
    }
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    match state.sitemap.sitemap_xml().await {
        Ok(body) => xml_response(body),
        Err(err) => HttpError::from_error(
            "infra::http::public::sitemap",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate sitemap",
            &err,
        )
        .into_response(),
    }
}

/// Rendered 404 for any route without a handler.
pub async fn not_found(State(state): State<HttpState>, uri: Uri) -> Response {
    render_not_found_response(state.chrome(uri.path()))
}

fn blog_error_response(state: &HttpState, path: &str, err: BlogError) -> Response {
    match err {
        BlogError::NotFound => render_not_found_response(state.chrome(path)),
        err @ BlogError::Repo(_) => HttpError::from_error(
            "infra::http::public::blog",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load the blog",
            &err,
        )
        .into_response(),
    }
}

fn xml_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, XML_CONTENT_TYPE)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
