//! Shared domain enumerations aligned with persisted database enums.

pub use duodriven_api_types::{ContactStatus, PostSource, PostStatus, SubscriberStatus};
