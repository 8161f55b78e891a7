//! Proxy between the site chat widget and the external chat workflow.

use std::sync::Arc;

use metrics::counter;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::gateways::{ChatForward, ChatGateway, GatewayError};

const METRIC_CHAT_UPSTREAM: &str = "duodriven_chat_upstream_total";
const LOGGED_BODY_CHARS: usize = 500;

pub const UNCONFIGURED_REPLY: &str =
    "I'm currently unavailable. Please email us at hello@duodriven.com";
pub const TIMEOUT_REPLY: &str = "I'm taking longer than expected. Please try again in a moment.";
pub const TRANSPORT_REPLY: &str = "I encountered a connection issue. Please try again.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat service not configured")]
    NotConfigured,
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Upstream(String),
}

impl ChatError {
    /// Text shown to the visitor in place of an answer.
    pub fn reply(&self) -> &'static str {
        match self {
            ChatError::NotConfigured => UNCONFIGURED_REPLY,
            ChatError::Timeout => TIMEOUT_REPLY,
            ChatError::Upstream(_) => TRANSPORT_REPLY,
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    gateway: Option<Arc<dyn ChatGateway>>,
}

impl ChatService {
    pub fn new(gateway: Option<Arc<dyn ChatGateway>>) -> Self {
        Self { gateway }
    }

    /// Forward a visitor message and shape the upstream answer as JSON.
    pub async fn ask(&self, message: String, session_id: Option<String>) -> Result<Value, ChatError> {
        let Some(gateway) = &self.gateway else {
            counter!(METRIC_CHAT_UPSTREAM, "outcome" => "unconfigured").increment(1);
            return Err(ChatError::NotConfigured);
        };

        let forward = ChatForward {
            chat_input: message,
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        };

        match gateway.send(&forward).await {
            Ok(body) => {
                counter!(METRIC_CHAT_UPSTREAM, "outcome" => "ok").increment(1);
                debug!(
                    session_id = %forward.session_id,
                    body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                    "chat upstream replied"
                );
                Ok(shape_reply(body))
            }
            Err(GatewayError::Timeout) => {
                counter!(METRIC_CHAT_UPSTREAM, "outcome" => "timeout").increment(1);
                warn!(session_id = %forward.session_id, "chat upstream timed out");
                Err(ChatError::Timeout)
            }
            Err(GatewayError::Transport(message)) => {
                counter!(METRIC_CHAT_UPSTREAM, "outcome" => "error").increment(1);
                warn!(session_id = %forward.session_id, error = %message, "chat upstream failed");
                Err(ChatError::Upstream(message))
            }
        }
    }
}

/// Unwrap single-element workflow arrays and wrap non-JSON bodies.
pub fn shape_reply(body: String) -> Value {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
        Ok(value) => value,
        Err(_) => json!({ "response": body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_array_element_is_returned() {
        let shaped = shape_reply(r#"[{"output":"hi"},{"output":"ignored"}]"#.to_string());
        assert_eq!(shaped, json!({"output": "hi"}));
    }

    #[test]
    fn empty_array_is_passed_through() {
        assert_eq!(shape_reply("[]".to_string()), json!([]));
    }

    #[test]
    fn plain_text_is_wrapped() {
        assert_eq!(
            shape_reply("Hello there".to_string()),
            json!({"response": "Hello there"})
        );
    }

    #[tokio::test]
    async fn missing_gateway_reports_not_configured() {
        let err = ChatService::new(None)
            .ask("hi".to_string(), None)
            .await
            .expect_err("unconfigured");
        assert!(matches!(err, ChatError::NotConfigured));
        assert_eq!(err.reply(), UNCONFIGURED_REPLY);
    }
}
