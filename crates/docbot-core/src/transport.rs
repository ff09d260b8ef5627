//! Outbound side of the messaging transport.

use docbot_types::error::TransportError;

/// Sends replies back to a messaging channel.
///
/// Implementations live in docbot-infra (Slack) and docbot-api (stdout).
pub trait MessageTransport: Send + Sync {
    fn send(
        &self,
        channel_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
