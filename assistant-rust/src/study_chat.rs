use crate::{
    in_flight::InFlight, ArtifactView, AssistantError, ChatRole, ChatThread, ChatTurn, Composer,
    StudyChatRequest,
};
use futures::lock::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

const GREETING: &str = "Hi there! I'm your AI Study Assistant. Ask me anything to help you with your studies, understand concepts, or prepare for exams!";

const ARTIFACT_INTRO: &str = "You can ask follow-up questions about the processed text below. I can use my general knowledge if needed.";

/// Where the chat takes its notes from.
#[derive(Clone)]
enum NotesSource {
    None,
    Fixed(String),
    /// Read the latest artifact body at every question.
    Artifact(ArtifactView),
}

impl NotesSource {
    async fn resolve(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Fixed(notes) => Some(notes.clone()),
            Self::Artifact(view) => view.body().await,
        }
    }
}

struct ChatState {
    thread: ChatThread,
    last_error: Option<String>,
}

/// A question and answer surface. It owns its thread and never writes to the
/// artifact it reads.
pub struct StudyChatController {
    composer: Arc<Composer>,
    notes: NotesSource,
    in_flight: InFlight<()>,
    state: Mutex<ChatState>,
}

impl StudyChatController {
    /// General study chat without notes. Starts with a greeting.
    #[must_use]
    pub fn standalone(composer: Arc<Composer>) -> Self {
        Self::with_thread(
            composer,
            NotesSource::None,
            [ChatTurn::assistant(GREETING)].into_iter().collect(),
        )
    }

    /// Chat about an artifact produced by a refinement surface.
    #[must_use]
    pub fn over_artifact(composer: Arc<Composer>, view: ArtifactView) -> Self {
        Self::with_thread(
            composer,
            NotesSource::Artifact(view),
            [ChatTurn::system(ARTIFACT_INTRO)].into_iter().collect(),
        )
    }

    /// Chat grounded on a fixed set of notes.
    #[must_use]
    pub fn with_notes(composer: Arc<Composer>, notes: impl Into<String>) -> Self {
        Self::with_thread(
            composer,
            NotesSource::Fixed(notes.into()),
            ChatThread::new(),
        )
    }

    fn with_thread(composer: Arc<Composer>, notes: NotesSource, thread: ChatThread) -> Self {
        Self {
            composer,
            notes,
            in_flight: InFlight::new(),
            state: Mutex::new(ChatState {
                thread,
                last_error: None,
            }),
        }
    }

    pub async fn thread(&self) -> ChatThread {
        self.state.lock().await.thread.clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.current().is_some()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    /// Ask a question. On success the question and answer are appended to the
    /// thread. On failure, or when the returned future is dropped early, the
    /// thread is left as it was.
    pub async fn ask(&self, question: impl Into<String>) -> Result<String, AssistantError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(AssistantError::InputMissing("question"));
        }

        let _in_flight = self
            .in_flight
            .begin(())
            .map_err(|()| AssistantError::Busy("study chat"))?;

        let history = {
            let state = self.state.lock().await;
            state
                .thread
                .turns()
                .iter()
                .filter(|turn| turn.role != ChatRole::System)
                .cloned()
                .collect::<Vec<_>>()
        };

        let mut request = StudyChatRequest::new(question.clone()).with_history(history);
        request.notes = self.notes.resolve().await;
        debug!(
            has_notes = request.notes.is_some(),
            history_turns = request.history.len(),
            "asking study chat"
        );

        let result = self.composer.answer(&request).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(answer) => {
                state.thread.push(ChatTurn::user(question));
                state.thread.push(ChatTurn::assistant(answer.clone()));
                state.last_error = None;
                Ok(answer)
            }
            Err(error) => {
                warn!(error = %error, "study chat question failed");
                state.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }
}
