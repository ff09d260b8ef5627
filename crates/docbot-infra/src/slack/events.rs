//! Slack Events API payloads.
//!
//! Only two event types matter: `app_mention` in channels and `message` in
//! direct messages. Everything else is acknowledged and ignored.

use serde::Deserialize;

use docbot_types::message::InboundMessage;

/// Outer body of an Events API request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    /// Sent once when the endpoint is configured; echo the challenge.
    UrlVerification { challenge: String },
    EventCallback {
        event: SlackEvent,
        #[serde(default)]
        event_id: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// The inner `event` object. Fields are optional because their presence
/// varies by event type and subtype.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

/// What to do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Dispatch(InboundMessage),
    /// A bare mention: reply with a greeting, skip the pipeline.
    Greet { channel_id: String },
    Ignore,
}

/// Decide how to handle one event.
pub fn classify(event: &SlackEvent) -> EventAction {
    // Never react to bots, including ourselves.
    if event.bot_id.is_some() {
        return EventAction::Ignore;
    }
    let Some(channel_id) = event.channel.clone().filter(|c| !c.is_empty()) else {
        return EventAction::Ignore;
    };
    let author_id = event.user.clone().unwrap_or_default();
    let text = event.text.as_deref().unwrap_or_default();

    match event.kind.as_str() {
        "app_mention" => {
            let text = strip_leading_mention(text);
            if text.is_empty() {
                EventAction::Greet { channel_id }
            } else {
                EventAction::Dispatch(InboundMessage {
                    channel_id,
                    author_id,
                    text: text.to_string(),
                    is_direct_message: false,
                })
            }
        }
        "message" => {
            // Subtypes are edits, joins, bot posts, and the like.
            let is_dm = event.channel_type.as_deref() == Some("im");
            let text = text.trim();
            if !is_dm || event.subtype.is_some() || text.is_empty() {
                return EventAction::Ignore;
            }
            EventAction::Dispatch(InboundMessage {
                channel_id,
                author_id,
                text: text.to_string(),
                is_direct_message: true,
            })
        }
        _ => EventAction::Ignore,
    }
}

/// Drop a leading `<@U123>` mention and surrounding whitespace.
pub fn strip_leading_mention(text: &str) -> &str {
    let trimmed = text.trim_start();
    if trimmed.starts_with("<@")
        && let Some(end) = trimmed.find('>')
    {
        return trimmed[end + 1..].trim();
    }
    trimmed.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, text: &str) -> SlackEvent {
        SlackEvent {
            kind: kind.to_string(),
            channel: Some("C1".to_string()),
            user: Some("U1".to_string()),
            text: Some(text.to_string()),
            ..SlackEvent::default()
        }
    }

    #[test]
    fn test_parse_url_verification() {
        let body = r#"{"token":"t","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#;
        let envelope: SlackEnvelope = serde_json::from_str(body).unwrap();
        assert!(matches!(envelope, SlackEnvelope::UrlVerification { challenge } if challenge.starts_with("3eZ")));
    }

    #[test]
    fn test_parse_event_callback() {
        let body = r#"{
            "type": "event_callback",
            "event_id": "Ev01",
            "event": {"type": "app_mention", "user": "U1", "text": "<@UBOT> hi", "channel": "C1", "ts": "1.2"}
        }"#;
        let SlackEnvelope::EventCallback { event, event_id } = serde_json::from_str(body).unwrap() else {
            panic!("expected event_callback");
        };
        assert_eq!(event_id.as_deref(), Some("Ev01"));
        assert_eq!(event.kind, "app_mention");
    }

    #[test]
    fn test_unknown_envelope_is_unsupported() {
        let envelope: SlackEnvelope = serde_json::from_str(r#"{"type":"app_rate_limited"}"#).unwrap();
        assert!(matches!(envelope, SlackEnvelope::Unsupported));
    }

    #[test]
    fn test_mention_is_stripped() {
        let action = classify(&event("app_mention", "<@UBOT123> what is the deadline?"));
        let EventAction::Dispatch(msg) = action else {
            panic!("expected dispatch");
        };
        assert_eq!(msg.text, "what is the deadline?");
        assert_eq!(msg.channel_id, "C1");
        assert!(!msg.is_direct_message);
    }

    #[test]
    fn test_bare_mention_greets() {
        assert_eq!(
            classify(&event("app_mention", "<@UBOT123>  ")),
            EventAction::Greet {
                channel_id: "C1".to_string()
            }
        );
    }

    #[test]
    fn test_direct_message_dispatches() {
        let mut dm = event("message", "  status?  ");
        dm.channel_type = Some("im".to_string());
        let EventAction::Dispatch(msg) = classify(&dm) else {
            panic!("expected dispatch");
        };
        assert_eq!(msg.text, "status?");
        assert!(msg.is_direct_message);
    }

    #[test]
    fn test_channel_messages_and_bots_are_ignored() {
        let mut channel_msg = event("message", "chatter");
        channel_msg.channel_type = Some("channel".to_string());
        assert_eq!(classify(&channel_msg), EventAction::Ignore);

        let mut bot = event("message", "I am a bot");
        bot.channel_type = Some("im".to_string());
        bot.bot_id = Some("B1".to_string());
        assert_eq!(classify(&bot), EventAction::Ignore);

        let mut edited = event("message", "edited");
        edited.channel_type = Some("im".to_string());
        edited.subtype = Some("message_changed".to_string());
        assert_eq!(classify(&edited), EventAction::Ignore);

        assert_eq!(classify(&event("reaction_added", "")), EventAction::Ignore);
    }

    #[test]
    fn test_strip_leading_mention_only() {
        assert_eq!(strip_leading_mention("<@U1> hi"), "hi");
        assert_eq!(strip_leading_mention("compare a > b"), "compare a > b");
        assert_eq!(strip_leading_mention("  plain  "), "plain");
    }
}
