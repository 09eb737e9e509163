//! Chat panel: the ordered message list of the public page.
//!
//! Each submitted question goes `idle → awaiting-response → resolved | errored`.
//! [`ChatPanel::begin`] appends the user's message and a loading
//! placeholder, [`ChatPanel::resolve`] swaps the placeholder for the answer
//! or an error in place. [`ChatPanel::ask`] does both around one API call.

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{QuestionRequest, QuestionResponse, SourceCitation};
use crate::traits::RagApi;

pub const GREETING: &str = "Hello! I am the asKNOU academic information guide for the Korea National Open University. Ask me anything, any time.";

pub const LOADING_TEXT: &str = "Generating an answer...";

/// Frequently asked questions offered as one-click prompts.
pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "수강신청 일정이 언제인가요?",
    "졸업 요건을 알려주세요",
    "시험 일정 및 방법은?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// What a message currently shows. A bot reply starts as `Loading` and is
/// replaced exactly once by `Answer` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Text(String),
    Loading,
    Answer {
        text: String,
        sources: Vec<SourceCitation>,
    },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub timestamp: DateTime<Local>,
    pub body: MessageBody,
}

impl Message {
    fn new(role: Role, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            timestamp: Local::now(),
            body,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.body, MessageBody::Loading)
    }

    pub fn text(&self) -> &str {
        match &self.body {
            MessageBody::Text(t) | MessageBody::Error(t) => t,
            MessageBody::Answer { text, .. } => text,
            MessageBody::Loading => LOADING_TEXT,
        }
    }

    pub fn sources(&self) -> &[SourceCitation] {
        match &self.body {
            MessageBody::Answer { sources, .. } => sources,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Question is empty.")]
    Empty,
    #[error("Question is too long ({len} characters, limit {limit}).")]
    TooLong { len: usize, limit: usize },
    #[error("An answer is still being generated.")]
    Busy,
}

/// Ticket for a question awaiting its answer.
#[derive(Debug)]
#[must_use = "a pending turn must be resolved or its placeholder stays loading"]
pub struct PendingTurn {
    question: String,
    placeholder: Uuid,
}

impl PendingTurn {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn placeholder_id(&self) -> Uuid {
        self.placeholder
    }
}

pub struct ChatPanel {
    messages: Vec<Message>,
    pending: usize,
    top_k: Option<u32>,
    max_chars: usize,
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPanel {
    /// A panel seeded with the greeting message.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::new(Role::Bot, MessageBody::Text(GREETING.to_string()))],
            pending: 0,
            top_k: None,
            max_chars: 1000,
        }
    }

    pub fn with_limits(mut self, top_k: Option<u32>, max_chars: usize) -> Self {
        self.top_k = top_k;
        self.max_chars = max_chars;
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a question awaits its answer; input is disabled.
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn suggested_questions() -> &'static [&'static str] {
        &SUGGESTED_QUESTIONS
    }

    /// Append the user's message and a loading placeholder.
    pub fn begin(&mut self, question: &str) -> Result<PendingTurn, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Empty);
        }
        let len = question.chars().count();
        if len > self.max_chars {
            return Err(ChatError::TooLong {
                len,
                limit: self.max_chars,
            });
        }
        if self.is_loading() {
            return Err(ChatError::Busy);
        }

        let user = Message::new(Role::User, MessageBody::Text(question.to_string()));
        let placeholder = Message::new(Role::Bot, MessageBody::Loading);
        let placeholder_id = placeholder.id;
        self.messages.push(user);
        self.messages.push(placeholder);
        self.pending += 1;

        Ok(PendingTurn {
            question: question.to_string(),
            placeholder: placeholder_id,
        })
    }

    /// Replace the turn's placeholder with the answer or an error message.
    /// Returns the settled message.
    pub fn resolve(
        &mut self,
        turn: PendingTurn,
        result: Result<QuestionResponse, ApiError>,
    ) -> &Message {
        let body = match result {
            Ok(response) => MessageBody::Answer {
                text: response.answer,
                sources: response.sources,
            },
            Err(err) => MessageBody::Error(error_text(&err)),
        };
        let settled = Message::new(Role::Bot, body);
        self.pending = self.pending.saturating_sub(1);

        match self.messages.iter().position(|m| m.id == turn.placeholder) {
            Some(pos) => {
                self.messages[pos] = settled;
                &self.messages[pos]
            }
            None => {
                self.messages.push(settled);
                &self.messages[self.messages.len() - 1]
            }
        }
    }

    /// Submit `question` and wait for the answer.
    pub async fn ask(&mut self, api: &dyn RagApi, question: &str) -> Result<&Message, ChatError> {
        let turn = self.begin(question)?;
        let request = QuestionRequest::new(turn.question(), self.top_k);
        tracing::debug!(question = turn.question(), "submitting question");
        let result = api.ask(&request).await;
        Ok(self.resolve(turn, result))
    }
}

/// The text shown in place of an answer when the ask call fails.
pub fn error_text(err: &ApiError) -> String {
    format!("Sorry, an error occurred: {}", err.user_message())
}
