//! Notification port: push messages to a device owner.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::id::UserId;

/// Delivers messages to users who registered a notification target.
pub trait NotificationDispatcher: Send + Sync {
    /// The user's registered target (e.g. a push token), if any.
    fn registered_target(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send;

    /// Send `message` to `target` on behalf of `user`.
    fn send(
        &self,
        user: UserId,
        target: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}
