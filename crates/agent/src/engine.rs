//! Conversation engine: one active state plus the conversation's context
//!
//! A turn is `run()` (send the active state's entry actions) followed by
//! `transition(input)` (classify as the active rule requires and move the
//! active pointer). Callers serialise turns per conversation.

use std::sync::Arc;

use chat_agent_core::{ConversationContext, OutgoingMessage, ResolvedIntent};
use serde::Serialize;

use crate::collaborators::Collaborators;
use crate::graph::StateGraph;
use crate::state::{Action, ConversationState, Observation, StateId, TransitionRule};

/// A rendered message and whether the messenger accepted it
#[derive(Debug, Clone, Serialize)]
pub struct SentMessage {
    pub message: OutgoingMessage,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one `run()` + `transition()` cycle
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    pub from: StateId,
    pub to: StateId,
    pub messages: Vec<SentMessage>,
}

pub struct ConversationEngine {
    graph: Arc<StateGraph>,
    collaborators: Arc<Collaborators>,
    active: StateId,
    context: ConversationContext,
}

impl ConversationEngine {
    /// Start at the graph's initial state
    pub fn new(
        graph: Arc<StateGraph>,
        collaborators: Arc<Collaborators>,
        context: ConversationContext,
    ) -> Self {
        let active = graph.initial().clone();
        Self {
            graph,
            collaborators,
            active,
            context,
        }
    }

    pub fn active(&self) -> &StateId {
        &self.active
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ConversationContext {
        &mut self.context
    }

    fn active_state(&self) -> &ConversationState {
        self.graph.state_or_initial(&self.active)
    }

    /// Render and send the active state's entry actions in order.
    ///
    /// A failed send is logged and the remaining actions still run.
    pub async fn run(&self) -> Vec<SentMessage> {
        let state = self.active_state();
        let conversation_id = self.context.conversation_id();
        let mut sent = Vec::with_capacity(state.actions.len());

        for action in &state.actions {
            let message = self.render(action);
            let result = self.collaborators.messenger().send(conversation_id, &message).await;
            match result {
                Ok(()) => sent.push(SentMessage {
                    message,
                    delivered: true,
                    error: None,
                }),
                Err(e) => {
                    tracing::warn!(
                        conversation_id = conversation_id,
                        state = %state.id,
                        error = %e,
                        "Failed to deliver message"
                    );
                    sent.push(SentMessage {
                        message,
                        delivered: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        sent
    }

    /// Classify `input` as the active rule requires and move to the next state
    pub async fn transition(&mut self, input: &str) -> &StateId {
        let rule = self.active_state().rule.clone();

        let observation = match &rule {
            TransitionRule::Goto { .. } => Observation::Nothing,
            TransitionRule::BySentiment { .. } => {
                Observation::Sentiment(self.collaborators.sentiment(input).await)
            }
            TransitionRule::ByIntent { candidates, .. } => {
                let outcome = self.collaborators.intent(input, candidates).await;
                if let chat_agent_text_processing::IntentOutcome::Matched(m) = &outcome {
                    tracing::debug!(
                        conversation_id = self.context.conversation_id(),
                        label = %m.label,
                        confidence = m.confidence,
                        method = m.method.as_str(),
                        "Intent resolved"
                    );
                }
                self.context.set_last_intent(outcome.clone().into());
                Observation::Intent(outcome)
            }
        };

        let next = rule.resolve(&observation).clone();
        tracing::debug!(
            conversation_id = self.context.conversation_id(),
            from = %self.active,
            to = %next,
            "State transition"
        );
        self.active = next;
        &self.active
    }

    /// One full turn
    pub async fn handle_turn(&mut self, input: &str) -> TurnReport {
        let from = self.active.clone();
        let messages = self.run().await;
        let to = self.transition(input).await.clone();
        self.context.record_turn();
        TurnReport { from, to, messages }
    }

    fn render(&self, action: &Action) -> OutgoingMessage {
        match action {
            Action::Say {
                template,
                quick_replies,
            } => OutgoingMessage::text(self.fill(template))
                .with_quick_replies(quick_replies.clone()),
            Action::Generate { fallback } => {
                OutgoingMessage::text(self.generated_or(fallback))
            }
            Action::AnnounceIntent { template, fallback } => match self.context.last_intent() {
                Some(ResolvedIntent::Matched { .. }) => OutgoingMessage::text(self.fill(template)),
                _ => OutgoingMessage::text(self.generated_or(fallback)),
            },
        }
    }

    fn generated_or(&self, fallback: &str) -> String {
        let generated = self.collaborators.generate();
        if generated.trim().is_empty() {
            self.fill(fallback)
        } else {
            generated
        }
    }

    fn fill(&self, template: &str) -> String {
        let name = self
            .context
            .display_name()
            .unwrap_or_else(|| self.graph.default_name());
        let intent = self
            .context
            .last_intent()
            .and_then(|i| i.label())
            .unwrap_or_default();
        template.replace("{name}", name).replace("{intent}", intent)
    }
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("conversation_id", &self.context.conversation_id())
            .field("active", &self.active)
            .finish()
    }
}
