//! Aggregate counters reported by the content API.

use std::sync::Arc;

use crate::application::repos::{
    ContactCounts, ContactsRepo, PostCounts, PostsRepo, RepoError, SubscribersRepo,
};
use crate::domain::types::SubscriberStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteStats {
    pub posts: PostCounts,
    pub active_subscribers: i64,
    pub contacts: ContactCounts,
}

#[derive(Clone)]
pub struct StatsService {
    posts: Arc<dyn PostsRepo>,
    subscribers: Arc<dyn SubscribersRepo>,
    contacts: Arc<dyn ContactsRepo>,
}

impl StatsService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        subscribers: Arc<dyn SubscribersRepo>,
        contacts: Arc<dyn ContactsRepo>,
    ) -> Self {
        Self {
            posts,
            subscribers,
            contacts,
        }
    }

    pub async fn collect(&self) -> Result<SiteStats, RepoError> {
        let (posts, active_subscribers, contacts) = tokio::try_join!(
            self.posts.post_counts(),
            self.subscribers.count_by_status(SubscriberStatus::Active),
            self.contacts.contact_counts(),
        )?;

        Ok(SiteStats {
            posts,
            active_subscribers,
            contacts,
        })
    }
}
