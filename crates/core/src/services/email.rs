//! Outgoing email for the password-reset flow.
//!
//! When no SMTP host is configured the service logs the reset link instead
//! of sending it, which is how local development runs.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use wastewatch_common::{AppError, AppResult, config::EmailConfig};

/// Email service.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    frontend_base: String,
}

impl EmailService {
    /// Create a new email service.
    ///
    /// `frontend_base` is the URL the reset link points at.
    pub fn new(config: &EmailConfig, frontend_base: String) -> AppResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        let transport = match &config.host {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| AppError::Config(format!("Invalid SMTP configuration: {e}")))?
                    .port(config.port);

                if let (Some(username), Some(password)) = (&config.username, &config.password) {
                    builder =
                        builder.credentials(Credentials::new(username.clone(), password.clone()));
                }

                Some(builder.build())
            }
            None => None,
        };

        Ok(Self {
            transport,
            from,
            frontend_base,
        })
    }

    /// Whether outgoing mail is actually configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a password-reset link to `to`.
    pub async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> AppResult<()> {
        let link = reset_link(&self.frontend_base, token);

        let Some(transport) = &self.transport else {
            tracing::info!(to = to, link = %link, "SMTP not configured; logging reset link");
            return Ok(());
        };

        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {e}")))?;

        let body = format!(
            "Hi {name},\n\n\
            You requested a password reset for your WasteWatch account.\n\n\
            Reset your password here (the link expires in one hour):\n{link}\n\n\
            If you didn't request this, you can safely ignore this email.",
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Reset your WasteWatch password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Build the frontend reset link for a token.
fn reset_link(base: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        base.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}
