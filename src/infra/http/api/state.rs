use std::sync::Arc;

use crate::application::newsletter::NewsletterService;
use crate::application::posts::PostService;
use crate::application::stats::StatsService;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    /// Shared credential; `None` rejects every authenticated call.
    pub api_key: Option<Arc<str>>,
    pub posts: Arc<PostService>,
    pub newsletter: Arc<NewsletterService>,
    pub stats: Arc<StatsService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}
