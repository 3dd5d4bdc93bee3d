//! Per-conversation context
//!
//! The context ("global frame") is owned by exactly one conversation engine
//! and passed by reference into every transition. It is never shared across
//! conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of the most recent intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedIntent {
    /// Classification picked a label
    Matched { label: String, confidence: f32 },
    /// Classification was inconclusive
    NoMatch,
}

impl ResolvedIntent {
    pub fn label(&self) -> Option<&str> {
        match self {
            ResolvedIntent::Matched { label, .. } => Some(label.as_str()),
            ResolvedIntent::NoMatch => None,
        }
    }
}

/// Mutable key/value store scoped to a single conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    conversation_id: String,
    display_name: Option<String>,
    last_intent: Option<ResolvedIntent>,
    turn_count: usize,
    started_at: DateTime<Utc>,
    #[serde(default)]
    values: HashMap<String, serde_json::Value>,
}

impl ConversationContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            display_name: None,
            last_intent: None,
            turn_count: 0,
            started_at: Utc::now(),
            values: HashMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = Some(name.into());
    }

    pub fn last_intent(&self) -> Option<&ResolvedIntent> {
        self.last_intent.as_ref()
    }

    pub fn set_last_intent(&mut self, intent: ResolvedIntent) {
        self.last_intent = Some(intent);
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Record that a turn was processed
    pub fn record_turn(&mut self) {
        self.turn_count += 1;
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let ctx = ConversationContext::new("user-1");
        assert_eq!(ctx.conversation_id(), "user-1");
        assert!(ctx.display_name().is_none());
        assert!(ctx.last_intent().is_none());
        assert_eq!(ctx.turn_count(), 0);
    }

    #[test]
    fn test_last_intent_label() {
        let mut ctx = ConversationContext::new("user-1").with_display_name("Ana");
        ctx.set_last_intent(ResolvedIntent::Matched {
            label: "greeting".to_string(),
            confidence: 1.0,
        });
        assert_eq!(ctx.last_intent().and_then(|i| i.label()), Some("greeting"));

        ctx.set_last_intent(ResolvedIntent::NoMatch);
        assert_eq!(ctx.last_intent().and_then(|i| i.label()), None);
    }

    #[test]
    fn test_values() {
        let mut ctx = ConversationContext::new("user-1");
        ctx.set("topic", serde_json::json!("billing"));
        assert_eq!(ctx.get("topic"), Some(&serde_json::json!("billing")));
        assert!(ctx.remove("topic").is_some());
        assert!(ctx.get("topic").is_none());
    }
}
