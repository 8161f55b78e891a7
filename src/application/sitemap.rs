//! Sitemap generation covering marketing pages and published posts.

use std::sync::Arc;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;

use crate::application::repos::{PostsRepo, RepoError};
use crate::application::syndication::normalize_public_site_url;

/// Marketing routes listed ahead of the posts, with their change frequency.
pub const MARKETING_PAGES: &[(&str, &str, &str)] = &[
    ("/", "weekly", "1.0"),
    ("/services", "monthly", "0.9"),
    ("/case-studies", "monthly", "0.8"),
    ("/technology", "monthly", "0.8"),
    ("/about", "monthly", "0.7"),
    ("/contact", "monthly", "0.7"),
    ("/blog", "daily", "0.9"),
];

#[derive(Clone)]
pub struct SitemapService {
    posts: Arc<dyn PostsRepo>,
    public_url: String,
}

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("failed to list posts: {0}")]
    Posts(#[from] RepoError),
}

impl SitemapService {
    pub fn new(posts: Arc<dyn PostsRepo>, public_url: impl Into<String>) -> Self {
        Self {
            posts,
            public_url: public_url.into(),
        }
    }

    pub async fn sitemap_xml(&self) -> Result<String, SitemapError> {
        let base = normalize_public_site_url(&self.public_url);
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );

        for (path, changefreq, priority) in MARKETING_PAGES {
            xml.push_str(&sitemap_entry(&base, path, None, changefreq, priority));
        }

        for post in self.posts.recent_published(None).await? {
            xml.push_str(&sitemap_entry(
                &base,
                &post.url(),
                Some(post.updated_at),
                "monthly",
                "0.7",
            ));
        }

        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

fn sitemap_entry(
    base: &str,
    path: &str,
    lastmod: Option<time::OffsetDateTime>,
    changefreq: &str,
    priority: &str,
) -> String {
    let loc = canonical_url(base, path);
    let lastmod_str = lastmod
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .map(|value| format!("<lastmod>{value}</lastmod>"))
        .unwrap_or_default();
    format!(
        "  <url><loc>{loc}</loc>{lastmod_str}<changefreq>{changefreq}</changefreq><priority>{priority}</priority></url>\n"
    )
}

fn canonical_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path == "/" {
        base.to_string()
    } else {
        format!("{base}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_has_no_trailing_slash() {
        assert_eq!(
            canonical_url("https://duodriven.com/", "/"),
            "https://duodriven.com"
        );
        assert_eq!(
            canonical_url("https://duodriven.com/", "/blog/growth"),
            "https://duodriven.com/blog/growth"
        );
    }

    #[test]
    fn entry_omits_missing_lastmod() {
        let entry = sitemap_entry("https://duodriven.com/", "/about", None, "monthly", "0.7");
        assert_eq!(
            entry,
            "  <url><loc>https://duodriven.com/about</loc><changefreq>monthly</changefreq><priority>0.7</priority></url>\n"
        );
    }
}
