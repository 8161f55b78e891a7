//! Outbound integration seams implemented by HTTP webhook clients.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

/// Message forwarded to the chat workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatForward {
    #[serde(rename = "chatInput")]
    pub chat_input: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Contact submission forwarded to the lead-handling workflow.
///
/// Optional fields travel as empty strings rather than `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactForward {
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub service_interest: String,
    pub budget_range: String,
    pub timestamp: String,
    pub source: &'static str,
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Forward a chat message and return the raw upstream body.
    async fn send(&self, message: &ChatForward) -> Result<String, GatewayError>;
}

#[async_trait]
pub trait ContactForwarder: Send + Sync {
    /// Deliver the submission; a non-success upstream status is an error.
    async fn forward(&self, submission: &ContactForward) -> Result<(), GatewayError>;
}
