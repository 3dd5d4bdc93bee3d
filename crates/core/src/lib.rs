//! Core traits and types for the chat agent
//!
//! This crate provides foundational types used across all other crates:
//! - Collaborator traits (messaging, sentiment, text cleaning)
//! - Per-conversation context
//! - Inbound/outbound message types
//! - Error types

pub mod conversation;
pub mod error;
pub mod message;
pub mod sentiment;
pub mod traits;

pub use conversation::{ConversationContext, ResolvedIntent};
pub use error::{Error, MessagingError, Result, SentimentError};
pub use message::{InboundMessage, OutgoingMessage, QuickReply};
pub use sentiment::Sentiment;

pub use traits::{Messenger, SentimentClassifier, TextCleaner};
