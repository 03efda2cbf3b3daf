use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::config::EmailConfig;

/// Send a password reset email with a reset token link.
///
/// Returns success even if the mail fails to send, to prevent user
/// enumeration; failures are logged for monitoring.
pub async fn send_password_reset_email(
    to_email: &str,
    reset_token: &str,
    config: &EmailConfig,
) -> Result<()> {
    let reset_link = format!("{}/reset-password/{}", config.base_url, reset_token);

    let body = format!(
        "Hello,\n\n\
         We received a request to reset your tastebook password.\n\
         Open the link below to choose a new one. The link expires in one hour.\n\n\
         {reset_link}\n\n\
         If you did not request this, you can safely ignore this email.\n"
    );

    let from_mailbox: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .context("Failed to parse from email")?;
    let to_mailbox: Mailbox = to_email.parse().context("Failed to parse to email")?;

    let email = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject("Password Reset Request - tastebook")
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .context("Failed to build email message")?;

    // Local dev (MailDev etc.) runs without credentials
    let mailer = if config.smtp_username.is_empty() && config.smtp_password.is_empty() {
        SmtpTransport::builder_dangerous(&config.smtp_host)
            .port(config.smtp_port)
            .build()
    } else {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );
        SmtpTransport::relay(&config.smtp_host)
            .context("Failed to create SMTP transport")?
            .port(config.smtp_port)
            .credentials(credentials)
            .build()
    };

    match mailer.send(&email) {
        Ok(_) => {
            info!(to = to_email, "Password reset email sent");
        }
        Err(e) => {
            warn!(error = %e, to = to_email, "Failed to send password reset email");
        }
    }

    Ok(())
}
