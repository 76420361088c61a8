use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    Simplify,
    Summarize,
    GenerateQa,
}

impl ProcessingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simplify => "simplify",
            Self::Summarize => "summarize",
            Self::GenerateQa => "generate_qa",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the generated body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    BulletPoints,
    StoryFormat,
}

impl OutputFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BulletPoints => "bullet_points",
            Self::StoryFormat => "story_format",
        }
    }

    /// Human wording used inside prompts.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::BulletPoints => "bullet points",
            Self::StoryFormat => "a story format",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to the composer.
///
/// With a `refinement_instruction` the request revises `prior_body`.
/// Without one it is an initial generation and only `mode` and `format`
/// select the instructions; any prior fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRequest {
    pub source_text: String,
    pub mode: ProcessingMode,
    pub format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_instruction: Option<String>,
}

impl ProcessingRequest {
    pub fn new(source_text: impl Into<String>, mode: ProcessingMode, format: OutputFormat) -> Self {
        Self {
            source_text: source_text.into(),
            mode,
            format,
            prior_body: None,
            prior_heading: None,
            refinement_instruction: None,
        }
    }

    /// Turn this into a refinement of `prior_body`.
    #[must_use]
    pub fn refine(
        mut self,
        prior_body: impl Into<String>,
        prior_heading: Option<String>,
        instruction: impl Into<String>,
    ) -> Self {
        self.prior_body = Some(prior_body.into());
        self.prior_heading = prior_heading;
        self.refinement_instruction = Some(instruction.into());
        self
    }

    #[must_use]
    pub fn is_refinement(&self) -> bool {
        self.refinement_instruction.is_some()
    }
}

/// Parsed and normalized model output. Emphasis inside `body` is
/// `<strong>` markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

/// Append-only, ordered list of chat turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    turns: Vec<ChatTurn>,
}

impl ChatThread {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Content of the most recent assistant turn.
    #[must_use]
    pub fn last_assistant(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == ChatRole::Assistant)
            .map(|turn| turn.content.as_str())
    }
}

impl FromIterator<ChatTurn> for ChatThread {
    fn from_iter<I: IntoIterator<Item = ChatTurn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

/// A question for the study chat, with optional notes to ground it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl StudyChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}
