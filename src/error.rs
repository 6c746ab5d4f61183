use thiserror::Error;

/// Everything that can go wrong inside the fetch/cache/send pipeline.
///
/// The public entry points (`MailboxFetcher::fetch`, `MailSender::send`,
/// `CacheStore::read`) collapse these into safe defaults; the `try_*`
/// variants hand them back so callers and tests can tell them apart.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup with {host} failed: {reason}")]
    Tls { host: String, reason: String },

    #[error("authentication as {user} failed: {source}")]
    Auth {
        user: String,
        #[source]
        source: imap::error::Error,
    },

    #[error("IMAP {op} failed: {source}")]
    Imap {
        op: &'static str,
        #[source]
        source: imap::error::Error,
    },

    #[error("message {0} returned no body")]
    MissingBody(String),

    #[error("message {id} is not valid MIME: {source}")]
    Parse {
        id: String,
        #[source]
        source: mailparse::MailParseError,
    },

    #[error("could not transfer-decode body part: {0}")]
    BodyEncoding(#[source] mailparse::MailParseError),

    #[error("unknown charset {0:?}")]
    UnknownCharset(String),

    #[error("cache I/O on {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache encoding: {0}")]
    CacheFormat(#[from] serde_json::Error),

    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

pub type Result<T, E = MailError> = std::result::Result<T, E>;
