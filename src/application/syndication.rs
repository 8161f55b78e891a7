//! RSS feed generation for the public blog.

use std::sync::Arc;

use thiserror::Error;
use time::format_description::well_known::Rfc2822;

use crate::application::repos::{PostsRepo, RepoError};

pub const FEED_ITEM_LIMIT: u32 = 20;
const FEED_TITLE: &str = "DUODRIVEN Blog";
const FEED_DESCRIPTION: &str =
    "Growth engineering, digital marketing and automation insights from DUODRIVEN.";

#[derive(Clone)]
pub struct SyndicationService {
    posts: Arc<dyn PostsRepo>,
    public_url: String,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to list posts: {0}")]
    Posts(#[from] RepoError),
}

impl SyndicationService {
    pub fn new(posts: Arc<dyn PostsRepo>, public_url: impl Into<String>) -> Self {
        Self {
            posts,
            public_url: public_url.into(),
        }
    }

    /// RSS 2.0 document over the most recently published posts.
    pub async fn rss_feed(&self) -> Result<String, FeedError> {
        let base = normalize_public_site_url(&self.public_url);
        let posts = self.posts.recent_published(Some(FEED_ITEM_LIMIT)).await?;

        let mut items = String::new();
        for post in posts {
            let published = post.published_at.unwrap_or(post.updated_at);
            let pub_date = published
                .format(&Rfc2822)
                .unwrap_or_else(|_| published.to_string());
            let link = format!("{base}blog/{}", post.slug);
            items.push_str(&format!(
                "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid>{}</guid>\n      <pubDate>{}</pubDate>\n      <category>{}</category>\n      <description><![CDATA[{}]]></description>\n    </item>\n",
                xml_escape(&post.title),
                link,
                link,
                pub_date,
                xml_escape(&post.category),
                cdata_safe(&post.excerpt),
            ));
        }

        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n  <channel>\n    <title>{}</title>\n    <link>{}blog</link>\n    <description>{}</description>\n    <language>en</language>\n{}  </channel>\n</rss>\n",
            FEED_TITLE, base, FEED_DESCRIPTION, items
        ))
    }
}

/// Base URL with exactly one trailing slash.
pub fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

pub fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// A literal `]]>` would end the CDATA section early.
fn cdata_safe(input: &str) -> String {
    input.replace("]]>", "]]]]><![CDATA[>")
}
