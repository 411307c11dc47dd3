//! Messages pushed to device owners.

use serde::{Deserialize, Serialize};

use crate::id::UserId;
use crate::time::Timestamp;

/// A message delivered to a user's registered target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user: UserId,
    /// Where the message went, e.g. a push token or an address.
    pub target: String,
    pub message: String,
    pub sent_at: Timestamp,
}
