use log::{info, warn};

use crate::domain::email::EmailRecord;
use crate::error::Result;
use crate::mail::decoders::decode_message;
use crate::mail::session::{MailboxConnector, MailboxSession, MessageId};
use crate::store::cache::CacheStore;

/// Pick the newest `max_emails` ids and split them into fetch batches.
///
/// `ids` must be ascending. Batches keep source order, but each batch is
/// reversed, so `[1..=7]` with a batch size of 3 yields
/// `[3,2,1] [6,5,4] [7]`. The output is newest-first only within a batch.
pub fn plan_batches(ids: &[MessageId], max_emails: usize, batch_size: usize) -> Vec<Vec<MessageId>> {
    let start = ids.len().saturating_sub(max_emails);
    ids[start..]
        .chunks(batch_size.max(1))
        .map(|batch| batch.iter().rev().copied().collect())
        .collect()
}

pub struct MailboxFetcher<C: MailboxConnector> {
    connector: C,
    cache: CacheStore,
    max_emails: usize,
    batch_size: usize,
}

impl<C: MailboxConnector> MailboxFetcher<C> {
    pub fn new(connector: C, cache: CacheStore, max_emails: usize, batch_size: usize) -> Self {
        Self {
            connector,
            cache,
            max_emails,
            batch_size,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Inbox records, from the cache when allowed and fresh, otherwise from
    /// the server. Session failures come back as an empty list.
    pub fn fetch(&self, use_cache: bool) -> Vec<EmailRecord> {
        match self.try_fetch(use_cache) {
            Ok(emails) => emails,
            Err(e) => {
                warn!("Error retrieving emails: {e}");
                Vec::new()
            }
        }
    }

    pub fn try_fetch(&self, use_cache: bool) -> Result<Vec<EmailRecord>> {
        if use_cache {
            // an empty cached list is not worth trusting
            if let Some(cached) = self.cache.read().filter(|c| !c.is_empty()) {
                info!("Using cached emails ({} messages)", cached.len());
                return Ok(cached);
            }
        }

        let emails = self.fetch_remote()?;

        if let Err(e) = self.cache.write(&emails) {
            warn!(
                "could not write cache {}: {e}",
                self.cache.path().display()
            );
        }
        info!("Fetched {} emails", emails.len());
        Ok(emails)
    }

    fn fetch_remote(&self) -> Result<Vec<EmailRecord>> {
        let mut session = self.connector.connect()?;
        let result = self.collect(&mut session);
        session.logout();
        result
    }

    fn collect(&self, session: &mut C::Session) -> Result<Vec<EmailRecord>> {
        let ids = session.list_ids()?;
        let batches = plan_batches(&ids, self.max_emails, self.batch_size);

        let mut out = Vec::with_capacity(batches.iter().map(Vec::len).sum());
        for batch in batches {
            for id in batch {
                let id_str = id.to_string();
                match session
                    .fetch_raw(id)
                    .and_then(|raw| decode_message(&id_str, &raw))
                {
                    Ok(record) => out.push(record),
                    Err(e) => warn!("Could not process email {id}: {e}"),
                }
            }
        }
        Ok(out)
    }
}
