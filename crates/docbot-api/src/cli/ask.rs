//! `docbot ask`: one message through the full pipeline, reply on stdout.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use docbot_core::transport::MessageTransport;
use docbot_types::error::TransportError;
use docbot_types::message::InboundMessage;

use crate::state::Runtime;

/// Prints replies instead of posting them.
pub struct StdoutTransport;

impl MessageTransport for StdoutTransport {
    async fn send(&self, _channel_id: &str, text: &str) -> Result<(), TransportError> {
        println!("{text}");
        Ok(())
    }
}

pub async fn ask(runtime: &Runtime, channel: String, text: Vec<String>, json: bool) -> Result<()> {
    let dispatcher = runtime.dispatcher(runtime.provider()?, Arc::new(StdoutTransport));
    let message = InboundMessage {
        channel_id: channel,
        author_id: "cli".to_string(),
        text: text.join(" "),
        is_direct_message: false,
    };

    if json {
        let outcome = dispatcher.process(&message).await;
        let out = serde_json::json!({
            "channel": message.channel_id,
            "state": outcome.state.to_string(),
            "reply": outcome.reply,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let outcome = dispatcher.handle(&message).await;
    eprintln!("{}", style(format!("[{}]", outcome.state)).dim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stdout_transport_never_fails() {
        assert!(StdoutTransport.send("cli", "hello").await.is_ok());
    }
}
