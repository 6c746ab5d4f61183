use log::debug;
use native_tls::{TlsConnector, TlsStream};
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{MailError, Result};
use crate::mail::session::{MailboxConnector, MailboxSession, MessageId};

type TlsSession = imap::Session<TlsStream<TcpStream>>;

/// IMAP-over-TLS endpoint plus the static credentials used to log in.
pub struct ImapClient {
    pub server: String,
    pub port: u16,
    pub user: String,
    password: String,
    timeout: Duration,
}

impl ImapClient {
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
            cfg.imap_server.clone(),
            cfg.imap_port,
            cfg.email.clone(),
            cfg.password.clone(),
            cfg.timeout(),
        )
    }

    fn connect_err(&self, source: io::Error) -> MailError {
        MailError::Connect {
            host: self.server.clone(),
            port: self.port,
            source,
        }
    }

    /// TCP connect with the configured timeout applied to connect, read and write.
    fn open_tcp(&self) -> Result<TcpStream> {
        let addrs = (self.server.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.connect_err(e))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| self.connect_err(e))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(self.connect_err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        })))
    }

    fn connect_and_auth(&self) -> Result<TlsSession> {
        let tcp = self.open_tcp()?;

        let tls = TlsConnector::builder().build().map_err(|e| MailError::Tls {
            host: self.server.clone(),
            reason: e.to_string(),
        })?;
        let stream = tls
            .connect(self.server.as_str(), tcp)
            .map_err(|e| MailError::Tls {
                host: self.server.clone(),
                reason: e.to_string(),
            })?;

        let mut client = imap::Client::new(stream);
        client
            .read_greeting()
            .map_err(|source| MailError::Imap {
                op: "greeting",
                source,
            })?;

        client
            .login(&self.user, &self.password)
            .map_err(|(source, _client)| MailError::Auth {
                user: self.user.clone(),
                source,
            })
    }
}

impl MailboxConnector for ImapClient {
    type Session = ImapSession;

    fn connect(&self) -> Result<ImapSession> {
        debug!("connecting to {}:{}", self.server, self.port);
        let inner = self.connect_and_auth()?;
        Ok(ImapSession {
            inner,
            selected: false,
        })
    }
}

pub struct ImapSession {
    inner: TlsSession,
    selected: bool,
}

impl MailboxSession for ImapSession {
    fn list_ids(&mut self) -> Result<Vec<MessageId>> {
        self.inner
            .select("INBOX")
            .map_err(|source| MailError::Imap {
                op: "select",
                source,
            })?;
        self.selected = true;

        // SEARCH hands back an unordered set
        let mut ids: Vec<MessageId> = self
            .inner
            .search("ALL")
            .map_err(|source| MailError::Imap {
                op: "search",
                source,
            })?
            .into_iter()
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn fetch_raw(&mut self, id: MessageId) -> Result<Vec<u8>> {
        let fetches = self
            .inner
            .fetch(id.to_string(), "RFC822")
            .map_err(|source| MailError::Imap {
                op: "fetch",
                source,
            })?;

        fetches
            .iter()
            .next()
            .and_then(|f| f.body())
            .map(|b| b.to_vec())
            .ok_or_else(|| MailError::MissingBody(id.to_string()))
    }

    fn logout(&mut self) {
        if self.selected {
            if let Err(e) = self.inner.close() {
                debug!("IMAP close failed: {e}");
            }
            self.selected = false;
        }
        if let Err(e) = self.inner.logout() {
            debug!("IMAP logout failed: {e}");
        }
    }
}
