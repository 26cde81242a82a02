//! Outgoing mail.

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

/// SMTP delivery through lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| AppError::Email("SMTP host is not configured".to_string()))?;

        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid sender address: {}", e)))?;

        // SMTP_SECURE means implicit TLS (port 465); otherwise upgrade with STARTTLS when offered.
        let builder = if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| AppError::Email(format!("Invalid SMTP relay: {}", e)))?
        } else {
            let tls = TlsParameters::new(host.to_string())
                .map_err(|e| AppError::Email(format!("Invalid TLS parameters: {}", e)))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).tls(Tls::Opportunistic(tls))
        };

        let mut builder = builder.port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Email(format!("Invalid recipient address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.text_body,
                message.html_body,
            ))
            .map_err(|e| AppError::Email(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::Email(format!("SMTP delivery failed: {}", e)))?;

        tracing::info!("Email sent to {}", message.to);
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, email not sent:\n{}",
            message.text_body
        );
        Ok(())
    }
}

pub fn create_mailer(config: &Config) -> Result<Arc<dyn Mailer>> {
    if config.smtp_configured() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        tracing::warn!("SMTP_HOST not set, emails will only be logged");
        Ok(Arc::new(LogMailer))
    }
}

pub fn password_reset_email(to: &str, name: &str, reset_url: &str) -> EmailMessage {
    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #2563eb; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
    .content {{ background: #f9fafb; padding: 30px; border-radius: 0 0 8px 8px; }}
    .button {{ display: inline-block; background: #2563eb; color: white; padding: 12px 30px; text-decoration: none; border-radius: 6px; margin: 20px 0; }}
    .link {{ word-break: break-all; background: #e5e7eb; padding: 10px; border-radius: 4px; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header"><h1>Reset your password</h1></div>
    <div class="content">
      <p>Hello {name},</p>
      <p>We received a request to reset the password of your Media Manager account.</p>
      <p style="text-align: center;"><a href="{url}" class="button">Choose a new password</a></p>
      <p>If the button does not work, copy this link into your browser:</p>
      <p class="link">{url}</p>
      <ul>
        <li>This link expires in <strong>1 hour</strong>.</li>
        <li>If you did not ask for a reset, you can ignore this email.</li>
        <li>Your current password stays valid until you choose a new one.</li>
      </ul>
    </div>
  </div>
</body>
</html>"#,
        name = escape_html(name),
        url = escape_html(reset_url),
    );

    let text_body = format!(
        "Hello {name},\n\n\
         We received a request to reset the password of your Media Manager account.\n\n\
         Open this link to choose a new password:\n{url}\n\n\
         This link expires in 1 hour. If you did not ask for a reset, you can ignore this email; \
         your current password stays valid until you choose a new one.\n",
        name = name,
        url = reset_url,
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Reset your password - Media Manager".to_string(),
        text_body,
        html_body,
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_email_contents() {
        let url = "http://localhost:3000/auth/reset-password?token=abc&x=1";
        let message = password_reset_email("jane@example.com", "Jane <3", url);

        assert_eq!(message.to, "jane@example.com");
        assert!(message.text_body.contains(url));
        assert!(message.text_body.contains("1 hour"));
        assert!(message.html_body.contains("token=abc&amp;x=1"));
        assert!(message.html_body.contains("Jane &lt;3"));
    }

    #[test]
    fn test_create_mailer_without_smtp_logs() {
        let config = Config::for_upload_dir("./uploads");
        assert!(create_mailer(&config).is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let mut config = Config::for_upload_dir("./uploads");
        config.smtp_host = Some("smtp.example.com".to_string());
        config.smtp_from = "not an address".to_string();

        assert!(matches!(SmtpMailer::new(&config), Err(AppError::Email(_))));
    }
}
