use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{info, warn};
use std::time::Duration;

use crate::config::Config;
use crate::error::{MailError, Result};

/// Sends single plain-text messages over implicit-TLS SMTP, one connection
/// per message.
pub struct MailSender {
    pub server: String,
    pub port: u16,
    pub user: String,
    password: String,
    timeout: Duration,
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse().map_err(|source| MailError::Address {
        address: address.to_string(),
        source,
    })
}

impl MailSender {
    pub fn new(
        server: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            user: user.into(),
            password: password.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.smtp_server.clone(),
            cfg.smtp_port,
            cfg.email.clone(),
            cfg.password.clone(),
            cfg.timeout(),
        )
    }

    pub fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message> {
        let message = Message::builder()
            .from(parse_mailbox(&self.user)?)
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        Ok(message)
    }

    /// `true` once the relay accepted the message; every failure is logged
    /// and reported as `false`.
    pub fn send(&self, to: &str, subject: &str, body: &str) -> bool {
        match self.try_send(to, subject, body) {
            Ok(()) => {
                info!("Message sent to {to}");
                true
            }
            Err(e) => {
                warn!("Error sending email to {to}: {e}");
                false
            }
        }
    }

    pub fn try_send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = self.build_message(to, subject, body)?;

        let mailer = SmtpTransport::relay(&self.server)?
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .timeout(Some(self.timeout))
            .build();

        mailer.send(&message)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn sender_on(port: u16) -> MailSender {
        MailSender::new(
            "127.0.0.1",
            port,
            "me@example.com",
            "secret",
            Duration::from_secs(2),
        )
    }

    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn message_carries_sender_recipient_and_subject() {
        let msg = sender_on(465)
            .build_message("bob@example.com", "Hello", "Hi Bob")
            .unwrap();
        let text = String::from_utf8(msg.formatted()).unwrap();

        assert!(text.contains("From: me@example.com"));
        assert!(text.contains("To: bob@example.com"));
        assert!(text.contains("Subject: Hello"));
        assert!(text.contains("text/plain"));
        assert!(text.contains("Hi Bob"));
    }

    #[test]
    fn malformed_recipient_is_rejected_before_connecting() {
        let sender = sender_on(closed_port());
        assert!(matches!(
            sender.try_send("not an address", "s", "b"),
            Err(MailError::Address { .. })
        ));
        assert!(!sender.send("not an address", "s", "b"));
    }

    #[test]
    fn unreachable_relay_reports_false() {
        let sender = sender_on(closed_port());
        assert!(!sender.send("bob@example.com", "Hello", "Hi Bob"));
        assert!(matches!(
            sender.try_send("bob@example.com", "Hello", "Hi Bob"),
            Err(MailError::Smtp(_))
        ));
    }
}
