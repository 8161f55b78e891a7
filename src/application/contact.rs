//! Contact form intake: validation, storage and webhook forwarding.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::application::gateways::{ContactForward, ContactForwarder};
use crate::application::repos::{ContactsRepo, CreateContactParams};
use crate::domain::posts::format_rfc3339;

const METRIC_SUBMISSIONS: &str = "duodriven_contact_submissions_total";
const METRIC_FAILURES: &str = "duodriven_contact_webhook_failures_total";
const FORWARD_SOURCE: &str = "website_contact_form";

pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Thank you for reaching out. Our engineering team will contact you within 24 hours.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Please provide a valid email address")]
    InvalidEmail,
}

#[derive(Debug, Clone, Default)]
pub struct ContactCommand {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service_interest: Option<String>,
    pub budget_range: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

#[derive(Clone)]
pub struct ContactService {
    contacts: Arc<dyn ContactsRepo>,
    forwarder: Option<Arc<dyn ContactForwarder>>,
}

impl ContactService {
    pub fn new(
        contacts: Arc<dyn ContactsRepo>,
        forwarder: Option<Arc<dyn ContactForwarder>>,
    ) -> Self {
        Self {
            contacts,
            forwarder,
        }
    }

    /// Validate and accept a submission.
    ///
    /// Once validation passes the submission counts as accepted: storage and
    /// forwarding failures are logged and counted but never returned.
    pub async fn submit(&self, command: ContactCommand) -> Result<(), ContactError> {
        let name = required(command.name, "name")?;
        let email = required(command.email, "email")?;
        let message = required(command.message, "message")?;
        if !email.contains('@') || !email.contains('.') {
            return Err(ContactError::InvalidEmail);
        }

        counter!(METRIC_SUBMISSIONS).increment(1);

        let params = CreateContactParams {
            name: name.clone(),
            email: email.clone(),
            company: command.company.clone(),
            phone: command.phone.clone(),
            message: message.clone(),
            service_interest: command.service_interest.clone(),
            budget_range: command.budget_range.clone(),
            utm_source: command.utm_source,
            utm_medium: command.utm_medium,
            utm_campaign: command.utm_campaign,
        };
        match self.contacts.create_submission(params).await {
            Ok(record) => info!(id = record.id, "contact submission stored"),
            Err(err) => {
                counter!(METRIC_FAILURES, "stage" => "store").increment(1);
                error!(error = %err, "failed to store contact submission");
            }
        }

        let Some(forwarder) = &self.forwarder else {
            warn!("contact webhook not configured; submission kept locally");
            return Ok(());
        };

        let payload = ContactForward {
            name,
            email,
            company: command.company.unwrap_or_default(),
            phone: command.phone.unwrap_or_default(),
            message,
            service_interest: command.service_interest.unwrap_or_default(),
            budget_range: command.budget_range.unwrap_or_default(),
            timestamp: format_rfc3339(OffsetDateTime::now_utc()),
            source: FORWARD_SOURCE,
        };
        if let Err(err) = forwarder.forward(&payload).await {
            counter!(METRIC_FAILURES, "stage" => "webhook").increment(1);
            error!(error = %err, "failed to forward contact submission");
        }

        Ok(())
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ContactError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(ContactError::MissingField(field))
}
