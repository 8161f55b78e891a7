//! Newsletter subscription handling.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateSubscriberParams, RepoError, SubscribersRepo};
use crate::domain::entities::NewsletterSubscriberRecord;
use crate::domain::types::SubscriberStatus;

const METRIC_SUBSCRIPTIONS: &str = "duodriven_newsletter_subscriptions_total";
const DEFAULT_SOURCE: &str = "website";

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("Valid email required")]
    InvalidEmail,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created,
    AlreadySubscribed,
    Reactivated,
}

impl SubscribeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubscribeOutcome::Created => "Successfully subscribed!",
            SubscribeOutcome::AlreadySubscribed => "Already subscribed",
            SubscribeOutcome::Reactivated => "Subscription reactivated",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SubscribeOutcome::Created => "created",
            SubscribeOutcome::AlreadySubscribed => "already_subscribed",
            SubscribeOutcome::Reactivated => "reactivated",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscribeCommand {
    pub email: Option<String>,
    pub name: Option<String>,
    pub source: Option<String>,
}

#[derive(Clone)]
pub struct NewsletterService {
    subscribers: Arc<dyn SubscribersRepo>,
}

impl NewsletterService {
    pub fn new(subscribers: Arc<dyn SubscribersRepo>) -> Self {
        Self { subscribers }
    }

    pub async fn subscribe(
        &self,
        command: SubscribeCommand,
    ) -> Result<SubscribeOutcome, NewsletterError> {
        let email = command
            .email
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(NewsletterError::InvalidEmail);
        }

        let outcome = match self.subscribers.find_by_email(&email).await? {
            Some(existing) if existing.status == SubscriberStatus::Active => {
                SubscribeOutcome::AlreadySubscribed
            }
            Some(existing) => {
                self.subscribers.reactivate(existing.id).await?;
                SubscribeOutcome::Reactivated
            }
            None => {
                let params = CreateSubscriberParams {
                    email: email.clone(),
                    name: command.name.filter(|name| !name.trim().is_empty()),
                    source: command
                        .source
                        .filter(|source| !source.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                };
                match self.subscribers.create_subscriber(params).await {
                    Ok(_) => SubscribeOutcome::Created,
                    // lost a race against an identical signup
                    Err(RepoError::Duplicate { .. }) => SubscribeOutcome::AlreadySubscribed,
                    Err(err) => return Err(err.into()),
                }
            }
        };

        counter!(METRIC_SUBSCRIPTIONS, "outcome" => outcome.label()).increment(1);
        info!(outcome = outcome.label(), "newsletter subscription handled");
        Ok(outcome)
    }

    pub async fn list(
        &self,
        status: SubscriberStatus,
    ) -> Result<Vec<NewsletterSubscriberRecord>, NewsletterError> {
        Ok(self.subscribers.list_by_status(status).await?)
    }
}
