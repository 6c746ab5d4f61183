pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod mail;
pub mod store;

pub use api::EmailApi;
pub use domain::email::EmailRecord;
pub use error::MailError;
