//! Inbound and outbound message types

use serde::{Deserialize, Serialize};

/// A user utterance delivered by the ingress layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Conversation (recipient) identifier
    pub conversation_id: String,
    /// Raw user text
    pub text: String,
    /// Display name of the user, if the ingress knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl InboundMessage {
    pub fn new(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A suggested reply shown to the user as a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReply {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub title: String,
    pub payload: String,
}

fn default_content_type() -> String {
    "text".to_string()
}

impl QuickReply {
    pub fn text(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            content_type: default_content_type(),
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// A rendered message ready to hand to a [`crate::Messenger`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_quick_replies(mut self, quick_replies: Vec<QuickReply>) -> Self {
        self.quick_replies = quick_replies;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_deserialization() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"conversation_id":"42","text":"hola"}"#).unwrap();
        assert_eq!(msg.conversation_id, "42");
        assert!(msg.display_name.is_none());
    }

    #[test]
    fn test_quick_reply_serialization() {
        let reply = QuickReply::text("Bien", "POSITIVE");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["content_type"], "text");
        assert_eq!(json["payload"], "POSITIVE");
    }

    #[test]
    fn test_outgoing_omits_empty_quick_replies() {
        let json = serde_json::to_value(OutgoingMessage::text("hola")).unwrap();
        assert!(json.get("quick_replies").is_none());
    }
}
