pub mod decoders;
pub mod fetcher;
pub mod imap_client;
pub mod session;
pub mod smtp_client;
