//! Development Mail Transport
//!
//! Logs outbound mail instead of sending it. Real transports live
//! outside this crate and only need to implement the `Mailer` port.

use crate::domain::mailer::Mailer;
use crate::domain::value_object::email::Email;

/// Mailer that records messages to the log and reports success
#[derive(Default, Clone)]
pub struct TracingMailer;

impl TracingMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Mailer for TracingMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> bool {
        tracing::info!(
            to = %to,
            subject = %subject,
            body_bytes = html_body.len(),
            "Outbound email (not sent: development transport)"
        );
        true
    }
}
