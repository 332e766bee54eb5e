//! Agricultural chat advisor.
//!
//! Sits in front of a [`ChatBackend`]: screens messages with the keyword
//! filter, builds prompts that quote the segment model's insights, keeps one
//! backend session per session id, and nudges off-topic replies back toward
//! agriculture.
//!
//! ```
//! use paddy::advisor::{Advisor, ChatRequest};
//!
//! // Without a backend every request that needs one is refused.
//! let advisor = Advisor::new(None, 1000);
//! let err = advisor
//!     .respond(&ChatRequest::new("How much nitrogen for rice?"), || None)
//!     .unwrap_err();
//! assert_eq!(err.user_message(), "AI service is currently unavailable. Please try again later.");
//! ```

mod keywords;
mod prompt;
mod session;

use serde::{Deserialize, Serialize};

pub use keywords::{is_agriculture_related, mentions_core_keyword, AGRICULTURE_KEYWORDS};
pub use prompt::{OFF_TOPIC_REPLY, WELCOME_MESSAGE};
pub use session::{ChatBackend, ChatError, ChatSession};

use crate::segment::SegmentInsights;
use session::SessionStore;

/// Session used when a request names none.
pub const DEFAULT_SESSION_ID: &str = "default";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("message has {len} characters, limit is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("no chat backend configured")]
    Unavailable,

    #[error(transparent)]
    Backend(#[from] ChatError),

    #[error("at least one predicted yield is required")]
    MissingPrediction,
}

impl AdvisorError {
    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            AdvisorError::EmptyMessage => "Message is required".to_string(),
            AdvisorError::MessageTooLong { max, .. } => {
                format!("Message too long. Please keep it under {max} characters.")
            }
            AdvisorError::Unavailable => {
                "AI service is currently unavailable. Please try again later.".to_string()
            }
            AdvisorError::Backend(_) => "I'm having trouble processing your request. Please try rephrasing your agricultural question.".to_string(),
            AdvisorError::MissingPrediction => "Prediction data is required".to_string(),
        }
    }
}

// =============================================================================
// Requests and replies
// =============================================================================

/// What the user told us about their farm. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmDetails {
    #[serde(alias = "state")]
    pub region: Option<String>,
    pub soil: Option<String>,
    pub land_area: Option<String>,
    pub irrigation: Option<String>,
    pub fertilizer: Option<String>,
}

impl FarmDetails {
    /// Region and soil, when both are given and non-blank.
    pub fn segment(&self) -> Option<(&str, &str)> {
        let region = self.region.as_deref().filter(|s| !s.trim().is_empty())?;
        let soil = self.soil.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((region, soil))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub context: Option<FarmDetails>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            context: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_context(mut self, context: FarmDetails) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub session_id: String,
    pub agriculture_related: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSession {
    pub session_id: String,
    pub welcome_message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionsReply {
    pub instructions: String,
    pub model_insights: Option<SegmentInsights>,
}

// =============================================================================
// Advisor
// =============================================================================

/// Keyword-gated chat over an optional backend.
pub struct Advisor {
    backend: Option<Box<dyn ChatBackend>>,
    sessions: SessionStore,
    max_message_chars: usize,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor")
            .field("backend_configured", &self.backend.is_some())
            .field("sessions", &self.sessions.len())
            .field("max_message_chars", &self.max_message_chars)
            .finish()
    }
}

impl Advisor {
    pub fn new(backend: Option<Box<dyn ChatBackend>>, max_message_chars: usize) -> Self {
        Self {
            backend,
            sessions: SessionStore::default(),
            max_message_chars,
        }
    }

    pub fn backend_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Answer one chat message.
    ///
    /// `insights` is called only for on-topic messages whose context names a
    /// region and soil; it returns the segment insights to quote, if any.
    ///
    /// # Errors
    ///
    /// - [`AdvisorError::EmptyMessage`] / [`AdvisorError::MessageTooLong`] on
    ///   invalid input (the backend is not called)
    /// - [`AdvisorError::Unavailable`] without a backend
    /// - [`AdvisorError::Backend`] if the backend call fails
    pub fn respond(
        &self,
        request: &ChatRequest,
        insights: impl FnOnce() -> Option<SegmentInsights>,
    ) -> Result<ChatReply, AdvisorError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AdvisorError::EmptyMessage);
        }
        let len = message.chars().count();
        if len > self.max_message_chars {
            return Err(AdvisorError::MessageTooLong {
                len,
                max: self.max_message_chars,
            });
        }

        let backend = self.backend.as_deref().ok_or(AdvisorError::Unavailable)?;
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

        if !is_agriculture_related(message) {
            tracing::debug!(%session_id, "off-topic chat message redirected");
            return Ok(ChatReply {
                text: OFF_TOPIC_REPLY.to_string(),
                session_id,
                agriculture_related: false,
            });
        }

        let model_context = match request.context.as_ref().and_then(FarmDetails::segment) {
            Some((region, soil)) => insights()
                .map(|i| prompt::model_context(region, soil, &i))
                .unwrap_or_default(),
            None => String::new(),
        };

        let session = self.sessions.get_or_start(&session_id, backend);
        let reply = session::send(&session, &prompt::advisor_prompt(message, &model_context))
            .map_err(|e| {
                tracing::error!(%session_id, error = %e, "chat backend failed");
                AdvisorError::Backend(e)
            })?;

        let text = if mentions_core_keyword(&reply) {
            reply
        } else {
            prompt::agricultural_preamble(&reply)
        };
        tracing::info!(%session_id, "agriculture response generated");

        Ok(ChatReply {
            text,
            session_id,
            agriculture_related: true,
        })
    }

    /// Open a new session with a random 8-character id.
    ///
    /// Without a backend the id is still issued but nothing is registered.
    pub fn new_session(&self) -> NewSession {
        let session_id = self.sessions.start_new(self.backend.as_deref());
        tracing::debug!(%session_id, "chat session created");
        NewSession {
            session_id,
            welcome_message: WELCOME_MESSAGE,
        }
    }

    /// One-shot farming instructions for the given predicted yields.
    ///
    /// Uses a fresh backend session that is not kept.
    pub fn instructions(
        &self,
        predictions: &[f64],
        farm: &FarmDetails,
        insights: Option<SegmentInsights>,
    ) -> Result<InstructionsReply, AdvisorError> {
        if predictions.is_empty() {
            return Err(AdvisorError::MissingPrediction);
        }
        let backend = self.backend.as_deref().ok_or(AdvisorError::Unavailable)?;

        let prompt = prompt::instructions_prompt(predictions, farm, insights.as_ref());
        let instructions = backend.start_session().send(&prompt).map_err(|e| {
            tracing::error!(error = %e, "instructions generation failed");
            AdvisorError::Backend(e)
        })?;

        Ok(InstructionsReply {
            instructions,
            model_insights: insights,
        })
    }
}
