//! Mailer Trait
//!
//! Interface for the outbound email collaborator. The transport itself
//! (SMTP, API provider) lives outside the core.

use crate::domain::value_object::email::Email;

/// Email transport trait
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send an email
    ///
    /// Returns `true` when the message was accepted for delivery. Any
    /// transport failure is reported as `false`; the caller treats it
    /// uniformly as `AuthError::DeliveryFailed`.
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> bool;
}
