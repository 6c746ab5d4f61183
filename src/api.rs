use anyhow::Result;

use crate::config::{Config, resolve_cache_path};
use crate::domain::email::EmailRecord;
use crate::mail::fetcher::MailboxFetcher;
use crate::mail::imap_client::ImapClient;
use crate::mail::session::MailboxConnector;
use crate::mail::smtp_client::MailSender;
use crate::store::cache::CacheStore;

/// The two operations the presentation layer may call, plus the list it
/// last received.
pub struct EmailApi<C: MailboxConnector = ImapClient> {
    fetcher: MailboxFetcher<C>,
    sender: MailSender,
    emails: Vec<EmailRecord>,
}

impl EmailApi<ImapClient> {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let cache = CacheStore::new(resolve_cache_path(cfg)?, cfg.cache_expiry());
        let fetcher = MailboxFetcher::new(
            ImapClient::from_config(cfg),
            cache,
            cfg.max_emails,
            cfg.batch_size,
        );
        Ok(Self::new(fetcher, MailSender::from_config(cfg)))
    }
}

impl<C: MailboxConnector> EmailApi<C> {
    pub fn new(fetcher: MailboxFetcher<C>, sender: MailSender) -> Self {
        Self {
            fetcher,
            sender,
            emails: Vec::new(),
        }
    }

    pub fn get_emails(&mut self, use_cache: bool) -> &[EmailRecord] {
        self.emails = self.fetcher.fetch(use_cache);
        &self.emails
    }

    pub fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        self.sender.send(to, subject, body)
    }

    pub fn emails(&self) -> &[EmailRecord] {
        &self.emails
    }

    pub fn find(&self, id: &str) -> Option<&EmailRecord> {
        self.emails.iter().find(|e| e.id == id)
    }
}
