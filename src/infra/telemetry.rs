use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every counter the service emits.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "duodriven_posts_created_total",
            Unit::Count,
            "Posts created through the content API, labelled by provenance."
        );
        describe_counter!(
            "duodriven_posts_updated_total",
            Unit::Count,
            "Posts updated through the content API."
        );
        describe_counter!(
            "duodriven_posts_deleted_total",
            Unit::Count,
            "Posts deleted through the content API."
        );
        describe_counter!(
            "duodriven_posts_published_by_sweep_total",
            Unit::Count,
            "Scheduled posts published by the publication sweep."
        );
        describe_counter!(
            "duodriven_post_views_total",
            Unit::Count,
            "Post detail views recorded by the blog reader."
        );
        describe_counter!(
            "duodriven_contact_submissions_total",
            Unit::Count,
            "Validated contact form submissions."
        );
        describe_counter!(
            "duodriven_contact_webhook_failures_total",
            Unit::Count,
            "Contact submissions whose storage or webhook forward failed."
        );
        describe_counter!(
            "duodriven_chat_upstream_total",
            Unit::Count,
            "Chat proxy calls labelled by upstream outcome."
        );
        describe_counter!(
            "duodriven_newsletter_subscriptions_total",
            Unit::Count,
            "Newsletter subscribe requests labelled by outcome."
        );
        describe_counter!(
            "duodriven_api_rate_limited_total",
            Unit::Count,
            "Content API requests rejected by the rate limiter."
        );
    });
}
