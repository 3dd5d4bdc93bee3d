//! Dialogue templates for the reference conversation topology
//!
//! Templates may use `{name}` (the user's display name) and `{intent}`
//! (the last resolved intent label).

use serde::{Deserialize, Serialize};

/// Quick reply button definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyConfig {
    pub title: String,
    pub payload: String,
}

impl QuickReplyConfig {
    fn new(title: &str, payload: &str) -> Self {
        Self {
            title: title.to_string(),
            payload: payload.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// First message of a conversation
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Question whose answer is classified by sentiment
    #[serde(default = "default_mood_prompt")]
    pub mood_prompt: String,

    #[serde(default = "default_mood_quick_replies")]
    pub mood_quick_replies: Vec<QuickReplyConfig>,

    #[serde(default = "default_positive_reaction")]
    pub positive_reaction: String,

    #[serde(default = "default_negative_reaction")]
    pub negative_reaction: String,

    /// Shared prompt both reaction branches converge on
    #[serde(default = "default_follow_up_prompt")]
    pub follow_up_prompt: String,

    /// Sent when the last classification resolved a label
    #[serde(default = "default_intent_acknowledgement")]
    pub intent_acknowledgement: String,

    /// Sent when no intent matched and the phrase generator produces nothing
    #[serde(default = "default_intent_fallback")]
    pub intent_fallback: String,

    /// Sent when the farewell phrase generator produces nothing usable
    #[serde(default = "default_farewell_fallback")]
    pub farewell_fallback: String,

    /// Intent label that ends the follow-up loop; `None` disables the route
    #[serde(default = "default_farewell_intent")]
    pub farewell_intent: Option<String>,

    /// Substituted for `{name}` when the user's name is unknown
    #[serde(default = "default_name")]
    pub default_name: String,
}

fn default_greeting() -> String {
    "Hola, {name}".to_string()
}

fn default_mood_prompt() -> String {
    "¿Cómo te sientes hoy?".to_string()
}

fn default_mood_quick_replies() -> Vec<QuickReplyConfig> {
    vec![
        QuickReplyConfig::new("😀", "me siento muy bien"),
        QuickReplyConfig::new("😞", "me siento mal"),
    ]
}

fn default_positive_reaction() -> String {
    "¡Qué gusto, {name}!".to_string()
}

fn default_negative_reaction() -> String {
    "Lo lamento, {name}.".to_string()
}

fn default_follow_up_prompt() -> String {
    "¿Te puedo ayudar con algo?".to_string()
}

fn default_intent_acknowledgement() -> String {
    "Entendido: {intent}".to_string()
}

fn default_intent_fallback() -> String {
    "No estoy seguro de haberte entendido.".to_string()
}

fn default_farewell_fallback() -> String {
    "¡Hasta luego, {name}!".to_string()
}

fn default_farewell_intent() -> Option<String> {
    Some("farewell".to_string())
}

fn default_name() -> String {
    "amigo".to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            mood_prompt: default_mood_prompt(),
            mood_quick_replies: default_mood_quick_replies(),
            positive_reaction: default_positive_reaction(),
            negative_reaction: default_negative_reaction(),
            follow_up_prompt: default_follow_up_prompt(),
            intent_acknowledgement: default_intent_acknowledgement(),
            intent_fallback: default_intent_fallback(),
            farewell_fallback: default_farewell_fallback(),
            farewell_intent: default_farewell_intent(),
            default_name: default_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
greeting: "Buenas, {name}"
farewell_intent: null
"#;
        let config: DialogueConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.greeting, "Buenas, {name}");
        assert!(config.farewell_intent.is_none());
        assert_eq!(config.mood_quick_replies.len(), 2);
        assert_eq!(config.default_name, "amigo");
        assert_ne!(config.intent_fallback, config.follow_up_prompt);
    }
}
