//! State graph and the reference conversation topology

use std::collections::HashMap;

use chat_agent_config::DialogueConfig;
use chat_agent_core::QuickReply;
use chat_agent_text_processing::IntentCorpus;

use crate::state::{compose, Action, ConversationState, StateId, TransitionRule};
use crate::AgentError;

/// State identities of the reference topology
pub mod ids {
    pub const INITIAL: &str = "initial";
    pub const POSITIVE_REACTION: &str = "positive_reaction";
    pub const NEGATIVE_REACTION: &str = "negative_reaction";
    pub const FOLLOW_UP: &str = "follow_up";
    pub const FAREWELL: &str = "farewell";
}

/// Validated set of states with a designated initial state
#[derive(Debug, Clone)]
pub struct StateGraph {
    states: HashMap<StateId, ConversationState>,
    initial: ConversationState,
    default_name: String,
}

impl StateGraph {
    /// Build and check that every referenced state exists
    pub fn new(initial: impl Into<StateId>, states: Vec<ConversationState>) -> Result<Self, AgentError> {
        let initial = initial.into();
        let mut by_id = HashMap::with_capacity(states.len());
        for state in states {
            let id = state.id.clone();
            if by_id.insert(id.clone(), state).is_some() {
                return Err(AgentError::Configuration(format!("duplicate state '{}'", id)));
            }
        }

        let initial = by_id.get(&initial).cloned().ok_or_else(|| {
            AgentError::Configuration(format!("initial state '{}' is not defined", initial))
        })?;

        for state in by_id.values() {
            for target in state.rule.targets() {
                if !by_id.contains_key(target) {
                    return Err(AgentError::Configuration(format!(
                        "state '{}' transitions to undefined state '{}'",
                        state.id, target
                    )));
                }
            }
        }

        Ok(Self {
            states: by_id,
            initial,
            default_name: String::new(),
        })
    }

    /// Name substituted for `{name}` when the user's name is unknown
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn initial(&self) -> &StateId {
        &self.initial.id
    }

    pub fn get(&self, id: &StateId) -> Option<&ConversationState> {
        self.states.get(id)
    }

    /// The state for `id`, or the initial state if `id` is unknown
    pub fn state_or_initial(&self, id: &StateId) -> &ConversationState {
        self.states.get(id).unwrap_or(&self.initial)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Check every candidate and routed label against the corpus
    pub fn validate_intents(&self, corpus: &IntentCorpus) -> Result<(), AgentError> {
        for state in self.states.values() {
            if let TransitionRule::ByIntent {
                candidates, routes, ..
            } = &state.rule
            {
                for label in candidates.iter().chain(routes.keys()) {
                    if !corpus.contains(label) {
                        return Err(AgentError::Configuration(format!(
                            "state '{}' references unknown intent '{}'",
                            state.id, label
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// The reference topology.
    ///
    /// `initial` greets and asks for the user's mood, then branches on
    /// sentiment. Each reaction is composed with the shared follow-up prompt,
    /// so both branches converge on `follow_up`, which acknowledges the
    /// resolved intent and loops until the farewell intent is seen.
    pub fn reference(dialogue: &DialogueConfig) -> Result<Self, AgentError> {
        let mood_replies = dialogue
            .mood_quick_replies
            .iter()
            .map(|r| QuickReply::text(&r.title, &r.payload))
            .collect();

        let initial = ConversationState::new(
            ids::INITIAL,
            vec![
                Action::say(&dialogue.greeting),
                Action::say_with_replies(&dialogue.mood_prompt, mood_replies),
            ],
            TransitionRule::BySentiment {
                positive: ids::POSITIVE_REACTION.into(),
                negative: ids::NEGATIVE_REACTION.into(),
                otherwise: ids::INITIAL.into(),
            },
        );

        let follow_up_prompt = ConversationState::new(
            "follow_up_prompt",
            vec![Action::say(&dialogue.follow_up_prompt)],
            TransitionRule::ByIntent {
                candidates: Vec::new(),
                routes: Default::default(),
                otherwise: ids::FOLLOW_UP.into(),
            },
        );

        let positive = ConversationState::new(
            "positive",
            vec![Action::say(&dialogue.positive_reaction)],
            TransitionRule::goto(ids::FOLLOW_UP),
        );
        let negative = ConversationState::new(
            "negative",
            vec![Action::say(&dialogue.negative_reaction)],
            TransitionRule::goto(ids::FOLLOW_UP),
        );

        let mut routes = std::collections::BTreeMap::new();
        if let Some(label) = &dialogue.farewell_intent {
            routes.insert(label.clone(), StateId::new(ids::FAREWELL));
        }
        let follow_up = ConversationState::new(
            ids::FOLLOW_UP,
            vec![
                Action::announce_intent(
                    &dialogue.intent_acknowledgement,
                    &dialogue.intent_fallback,
                ),
                Action::say(&dialogue.follow_up_prompt),
            ],
            TransitionRule::ByIntent {
                candidates: Vec::new(),
                routes,
                otherwise: ids::FOLLOW_UP.into(),
            },
        );

        let farewell = ConversationState::new(
            ids::FAREWELL,
            vec![Action::generate(&dialogue.farewell_fallback)],
            TransitionRule::goto(ids::INITIAL),
        );

        let graph = Self::new(
            ids::INITIAL,
            vec![
                initial,
                compose(ids::POSITIVE_REACTION, &positive, &follow_up_prompt),
                compose(ids::NEGATIVE_REACTION, &negative, &follow_up_prompt),
                follow_up,
                farewell,
            ],
        )?;
        Ok(graph.with_default_name(&dialogue.default_name))
    }
}
