use serde::{Deserialize, Serialize};

/// Placeholder used for headers that are absent or empty.
pub const MISSING_HEADER: &str = "None";

/// Placeholder body for single-part messages whose payload can't be decoded.
pub const UNDECODABLE_BODY: &str = "Could not decode message body";

/// One inbox message, normalized for display. Field names match the
/// on-disk cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    pub body: String,
}
