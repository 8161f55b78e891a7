//! HTTP clients for the external chat and lead-handling workflows.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::gateways::{
    ChatForward, ChatGateway, ContactForward, ContactForwarder, GatewayError,
};

fn user_agent() -> &'static str {
    concat!("duodriven/", env!("CARGO_PKG_VERSION"))
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
}

fn classify(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/// Forwards chat messages to a webhook and relays the raw reply body.
pub struct WebhookChatGateway {
    url: String,
    client: Client,
}

impl WebhookChatGateway {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ChatGateway for WebhookChatGateway {
    async fn send(&self, message: &ChatForward) -> Result<String, GatewayError> {
        // The upstream status is not inspected; its body is relayed either way.
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(classify)?;
        response.text().await.map_err(classify)
    }
}

/// Posts contact submissions to the lead-handling webhook.
pub struct WebhookContactForwarder {
    url: String,
    client: Client,
}

impl WebhookContactForwarder {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            url,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ContactForwarder for WebhookContactForwarder {
    async fn forward(&self, submission: &ContactForward) -> Result<(), GatewayError> {
        self.client
            .post(&self.url)
            .json(submission)
            .send()
            .await
            .map_err(classify)?
            .error_for_status()
            .map_err(classify)?;
        Ok(())
    }
}
