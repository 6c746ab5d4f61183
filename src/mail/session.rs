use crate::error::Result;

/// Protocol-assigned message identifier (IMAP sequence number).
pub type MessageId = u32;

/// An authenticated, inbox-selected mailbox connection.
pub trait MailboxSession {
    /// Every message identifier in the inbox, ascending.
    fn list_ids(&mut self) -> Result<Vec<MessageId>>;

    /// Full raw RFC 822 content of one message.
    fn fetch_raw(&mut self, id: MessageId) -> Result<Vec<u8>>;

    /// Close the mailbox and log out. Errors are swallowed; the session is
    /// unusable afterwards either way.
    fn logout(&mut self);
}

/// Opens one fresh `MailboxSession` per call.
pub trait MailboxConnector {
    type Session: MailboxSession;

    fn connect(&self) -> Result<Self::Session>;
}
