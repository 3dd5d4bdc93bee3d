//! Conversation states as data
//!
//! A state is an identity, an ordered list of entry actions and a transition
//! rule. Rules are resolved by a pure function of the classification outcome,
//! so the next state depends only on (current state, input, classification).

use std::collections::BTreeMap;
use std::fmt;

use chat_agent_core::{QuickReply, Sentiment};
use chat_agent_text_processing::IntentOutcome;
use serde::{Deserialize, Serialize};

/// State identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Entry action, rendered against the conversation context when run.
///
/// Templates may use `{name}` (display name) and `{intent}` (last resolved
/// intent label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Send a fixed template, optionally with quick replies
    Say {
        template: String,
        #[serde(default)]
        quick_replies: Vec<QuickReply>,
    },
    /// Send a formatted Markov phrase; `fallback` when nothing is generated
    Generate { fallback: String },
    /// Acknowledge the last resolved intent; a generated phrase when the
    /// last classification was inconclusive, `fallback` if that is empty too
    AnnounceIntent { template: String, fallback: String },
}

impl Action {
    pub fn say(template: impl Into<String>) -> Self {
        Action::Say {
            template: template.into(),
            quick_replies: Vec::new(),
        }
    }

    pub fn say_with_replies(template: impl Into<String>, quick_replies: Vec<QuickReply>) -> Self {
        Action::Say {
            template: template.into(),
            quick_replies,
        }
    }

    pub fn generate(fallback: impl Into<String>) -> Self {
        Action::Generate {
            fallback: fallback.into(),
        }
    }

    pub fn announce_intent(template: impl Into<String>, fallback: impl Into<String>) -> Self {
        Action::AnnounceIntent {
            template: template.into(),
            fallback: fallback.into(),
        }
    }
}

/// What a rule needs to know about the input
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Rule consults no classifier
    Nothing,
    /// Sentiment collaborator output; `None` when inconclusive or failed
    Sentiment(Option<Sentiment>),
    Intent(IntentOutcome),
}

/// Transition rule of a state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionRule {
    /// Unconditional
    Goto { target: StateId },
    /// Branch on the sentiment collaborator's label
    BySentiment {
        positive: StateId,
        negative: StateId,
        otherwise: StateId,
    },
    /// Classify the input among `candidates` (all corpus labels when empty)
    /// and route by label
    ByIntent {
        #[serde(default)]
        candidates: Vec<String>,
        #[serde(default)]
        routes: BTreeMap<String, StateId>,
        otherwise: StateId,
    },
}

impl TransitionRule {
    pub fn goto(target: impl Into<StateId>) -> Self {
        TransitionRule::Goto {
            target: target.into(),
        }
    }

    /// Next state for an observation
    pub fn resolve(&self, observation: &Observation) -> &StateId {
        match self {
            TransitionRule::Goto { target } => target,
            TransitionRule::BySentiment {
                positive,
                negative,
                otherwise,
            } => match observation {
                Observation::Sentiment(Some(Sentiment::Positive)) => positive,
                Observation::Sentiment(Some(Sentiment::Negative)) => negative,
                _ => otherwise,
            },
            TransitionRule::ByIntent {
                routes, otherwise, ..
            } => match observation {
                Observation::Intent(IntentOutcome::Matched(m)) => {
                    routes.get(&m.label).unwrap_or(otherwise)
                }
                _ => otherwise,
            },
        }
    }

    /// Every state this rule can lead to
    pub fn targets(&self) -> Vec<&StateId> {
        match self {
            TransitionRule::Goto { target } => vec![target],
            TransitionRule::BySentiment {
                positive,
                negative,
                otherwise,
            } => vec![positive, negative, otherwise],
            TransitionRule::ByIntent {
                routes, otherwise, ..
            } => routes.values().chain(std::iter::once(otherwise)).collect(),
        }
    }
}

impl From<String> for StateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Immutable state descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: StateId,
    pub actions: Vec<Action>,
    pub rule: TransitionRule,
}

impl ConversationState {
    pub fn new(id: impl Into<StateId>, actions: Vec<Action>, rule: TransitionRule) -> Self {
        Self {
            id: id.into(),
            actions,
            rule,
        }
    }

    pub fn entry_actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn next(&self, observation: &Observation) -> &StateId {
        self.rule.resolve(observation)
    }
}

/// Compose two states: `first`'s actions then `second`'s, with `second`'s rule
pub fn compose(
    id: impl Into<StateId>,
    first: &ConversationState,
    second: &ConversationState,
) -> ConversationState {
    ConversationState {
        id: id.into(),
        actions: first
            .actions
            .iter()
            .chain(second.actions.iter())
            .cloned()
            .collect(),
        rule: second.rule.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_agent_text_processing::{IntentMatch, MatchMethod};

    fn matched(label: &str) -> Observation {
        Observation::Intent(IntentOutcome::Matched(IntentMatch {
            label: label.to_string(),
            confidence: 0.8,
            method: MatchMethod::Cosine,
        }))
    }

    #[test]
    fn test_compose_concatenates_actions_and_keeps_second_rule() {
        let first = ConversationState::new("a", vec![Action::say("uno")], TransitionRule::goto("x"));
        let second = ConversationState::new(
            "b",
            vec![Action::say("dos"), Action::generate("tres")],
            TransitionRule::goto("y"),
        );

        let composed = compose("ab", &first, &second);
        assert_eq!(composed.id, StateId::new("ab"));
        assert_eq!(
            composed.actions,
            vec![Action::say("uno"), Action::say("dos"), Action::generate("tres")]
        );
        assert_eq!(composed.rule, TransitionRule::goto("y"));
        // inputs untouched
        assert_eq!(first.actions.len(), 1);
    }

    #[test]
    fn test_sentiment_rule() {
        let rule = TransitionRule::BySentiment {
            positive: "happy".into(),
            negative: "sad".into(),
            otherwise: "again".into(),
        };
        assert_eq!(rule.resolve(&Observation::Sentiment(Some(Sentiment::Positive))).as_str(), "happy");
        assert_eq!(rule.resolve(&Observation::Sentiment(Some(Sentiment::Negative))).as_str(), "sad");
        assert_eq!(rule.resolve(&Observation::Sentiment(None)).as_str(), "again");
        assert_eq!(rule.resolve(&Observation::Nothing).as_str(), "again");
    }

    #[test]
    fn test_intent_rule() {
        let rule = TransitionRule::ByIntent {
            candidates: vec![],
            routes: BTreeMap::from([("farewell".to_string(), StateId::new("bye"))]),
            otherwise: "loop".into(),
        };
        assert_eq!(rule.resolve(&matched("farewell")).as_str(), "bye");
        assert_eq!(rule.resolve(&matched("greeting")).as_str(), "loop");
        assert_eq!(rule.resolve(&Observation::Intent(IntentOutcome::NoMatch)).as_str(), "loop");
        assert_eq!(rule.targets().len(), 2);
    }

    #[test]
    fn test_rule_serde() {
        let yaml = r#"
kind: by_intent
routes:
  farewell: bye
otherwise: loop
"#;
        let rule: TransitionRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.resolve(&matched("farewell")).as_str(), "bye");

        let action: Action = serde_yaml::from_str("kind: say\ntemplate: hola").unwrap();
        assert_eq!(action, Action::say("hola"));
    }
}
