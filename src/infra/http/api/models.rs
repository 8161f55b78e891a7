//! Conversions from domain records to wire types.

use duodriven_api_types::{
    BlogStats, ContactStats, NewsletterStats, PostMutationResponse, PostResponse, StatsResponse,
    SubscriberSummary,
};

use crate::application::stats::SiteStats;
use crate::domain::entities::{NewsletterSubscriberRecord, PostRecord};
use crate::domain::posts::format_rfc3339;

pub fn post_response(post: PostRecord) -> PostResponse {
    let url = post.url();
    PostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        excerpt: post.excerpt,
        content: post.content,
        featured_image: post.featured_image,
        meta_title: post.meta_title,
        meta_description: post.meta_description,
        category: post.category,
        tags: post.tags,
        status: post.status,
        published_at: post.published_at.map(format_rfc3339),
        scheduled_for: post.scheduled_for.map(format_rfc3339),
        author: post.author,
        read_time: post.read_time,
        views: post.views,
        created_at: format_rfc3339(post.created_at),
        updated_at: format_rfc3339(post.updated_at),
        source: post.source,
        external_id: post.external_id,
        url,
    }
}

pub fn mutation_response(post: &PostRecord, include_status: bool) -> PostMutationResponse {
    PostMutationResponse {
        success: true,
        id: post.id,
        slug: post.slug.clone(),
        url: post.url(),
        status: include_status.then_some(post.status),
    }
}

pub fn subscriber_summary(subscriber: NewsletterSubscriberRecord) -> SubscriberSummary {
    SubscriberSummary {
        id: subscriber.id,
        email: subscriber.email,
        name: subscriber.name,
        subscribed_at: Some(format_rfc3339(subscriber.subscribed_at)),
    }
}

pub fn stats_response(stats: SiteStats) -> StatsResponse {
    StatsResponse {
        blog: BlogStats {
            total_posts: stats.posts.total,
            published: stats.posts.published,
            drafts: stats.posts.drafts,
            scheduled: stats.posts.scheduled,
            total_views: stats.posts.total_views,
        },
        newsletter: NewsletterStats {
            total_subscribers: stats.active_subscribers,
        },
        contacts: ContactStats {
            total: stats.contacts.total,
            new: stats.contacts.new,
        },
    }
}
