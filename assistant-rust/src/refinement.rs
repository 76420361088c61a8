use crate::{
    in_flight::{InFlight, InFlightGuard},
    Artifact, ArtifactHandle, ArtifactView, AssistantError, ChatThread, ChatTurn, Composer,
    OutputFormat, ProcessingMode, ProcessingRequest,
};
use futures::lock::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a refinement surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceState {
    Empty,
    Generating,
    Ready,
    Refining,
    Failed,
}

/// The request a failed attempt was made with, kept so it can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Generate {
        source_text: String,
        mode: ProcessingMode,
        format: OutputFormat,
    },
    Refine {
        instruction: String,
    },
}

#[derive(Debug, Clone)]
pub struct FailedAttempt {
    pub attempt: Attempt,
    pub error: String,
    /// `Empty` or `Ready`: where the surface stood before the attempt. The
    /// artifact and the thread are still exactly as they were then.
    pub prior_state: SurfaceState,
}

struct Session {
    source_text: String,
    mode: ProcessingMode,
    format: OutputFormat,
}

struct RefinementState {
    /// `Empty`, `Ready` or `Failed`. Calls in flight live in `in_flight`.
    surface: SurfaceState,
    session: Option<Session>,
    artifact: ArtifactHandle,
    thread: ChatThread,
    last_failure: Option<FailedAttempt>,
}

/// Owns the current artifact of a process and refine flow and threads it
/// through successive refinement instructions.
///
/// One model call may be in flight at a time. While it runs, further
/// submissions fail with [`AssistantError::Busy`]. Dropping a pending
/// `generate` or `refine` frees the surface and commits nothing.
pub struct RefinementController {
    composer: Arc<Composer>,
    view: ArtifactView,
    in_flight: InFlight<SurfaceState>,
    state: Mutex<RefinementState>,
}

impl RefinementController {
    #[must_use]
    pub fn new(composer: Arc<Composer>) -> Self {
        let artifact = ArtifactHandle::new();
        Self {
            composer,
            view: artifact.view(),
            in_flight: InFlight::new(),
            state: Mutex::new(RefinementState {
                surface: SurfaceState::Empty,
                session: None,
                artifact,
                thread: ChatThread::new(),
                last_failure: None,
            }),
        }
    }

    /// Read-only access to the artifact, for a Q&A surface.
    #[must_use]
    pub fn view(&self) -> ArtifactView {
        self.view.clone()
    }

    pub async fn state(&self) -> SurfaceState {
        if let Some(activity) = self.in_flight.current() {
            return activity;
        }
        self.state.lock().await.surface
    }

    pub async fn artifact(&self) -> Option<Artifact> {
        self.view.current().await
    }

    pub async fn thread(&self) -> ChatThread {
        self.state.lock().await.thread.clone()
    }

    pub async fn last_failure(&self) -> Option<FailedAttempt> {
        self.state.lock().await.last_failure.clone()
    }

    /// Generate a fresh artifact from `source_text`. Replaces any previous
    /// artifact and starts a new refinement thread.
    pub async fn generate(
        &self,
        source_text: impl Into<String>,
        mode: ProcessingMode,
        format: OutputFormat,
    ) -> Result<Artifact, AssistantError> {
        let source_text = source_text.into();
        if source_text.trim().is_empty() {
            return Err(AssistantError::InputMissing("source text"));
        }

        let _in_flight = self.begin(SurfaceState::Generating)?;
        debug!(%mode, %format, "generating artifact");

        let request = ProcessingRequest::new(source_text.clone(), mode, format);
        let result = self.composer.process(&request).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(result) => {
                let artifact = state.artifact.replace(result).await;
                state.thread = [
                    ChatTurn::system(intro_message(mode)),
                    ChatTurn::assistant(artifact.body.clone()),
                ]
                .into_iter()
                .collect();
                state.session = Some(Session {
                    source_text,
                    mode,
                    format,
                });
                state.surface = SurfaceState::Ready;
                state.last_failure = None;
                debug!(version = artifact.version, "artifact ready");
                Ok(artifact)
            }
            Err(error) => Err(fail(
                &mut state,
                Attempt::Generate {
                    source_text,
                    mode,
                    format,
                },
                error,
            )),
        }
    }

    /// Revise the current artifact per `instruction`. The latest artifact is
    /// always the base.
    pub async fn refine(&self, instruction: impl Into<String>) -> Result<Artifact, AssistantError> {
        let instruction = instruction.into();
        if instruction.trim().is_empty() {
            return Err(AssistantError::InputMissing("refinement instruction"));
        }

        let _in_flight = self.begin(SurfaceState::Refining)?;
        let request = {
            let state = self.state.lock().await;
            let base = state.artifact.current().await;
            let (Some(session), Some(base)) = (state.session.as_ref(), base) else {
                return Err(AssistantError::InvalidRequest(
                    "There is no artifact to refine yet".to_string(),
                ));
            };

            let request = ProcessingRequest::new(
                session.source_text.clone(),
                session.mode,
                session.format,
            )
            .refine(base.body, base.heading, instruction.clone());

            debug!(from = ?state.surface, base_version = base.version, "refining artifact");
            request
        };

        let result = self.composer.process(&request).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(result) => {
                let artifact = state.artifact.replace(result).await;
                state.thread.push(ChatTurn::user(instruction));
                state.thread.push(ChatTurn::assistant(artifact.body.clone()));
                state.surface = SurfaceState::Ready;
                state.last_failure = None;
                debug!(version = artifact.version, "artifact refined");
                Ok(artifact)
            }
            Err(error) => Err(fail(&mut state, Attempt::Refine { instruction }, error)),
        }
    }

    fn begin(
        &self,
        activity: SurfaceState,
    ) -> Result<InFlightGuard<'_, SurfaceState>, AssistantError> {
        self.in_flight
            .begin(activity)
            .map_err(|_| AssistantError::Busy("refinement"))
    }

    /// Re-submit the request of the last failed attempt.
    pub async fn retry(&self) -> Result<Artifact, AssistantError> {
        let failure = self.state.lock().await.last_failure.clone();
        match failure.map(|failure| failure.attempt) {
            Some(Attempt::Generate {
                source_text,
                mode,
                format,
            }) => self.generate(source_text, mode, format).await,
            Some(Attempt::Refine { instruction }) => self.refine(instruction).await,
            None => Err(AssistantError::InvalidRequest(
                "There is no failed request to retry".to_string(),
            )),
        }
    }
}

/// Record a failed attempt. The artifact and the thread stay as they were
/// before the attempt.
fn fail(state: &mut RefinementState, attempt: Attempt, error: AssistantError) -> AssistantError {
    warn!(error = %error, ?attempt, "refinement surface attempt failed");
    let prior_state = if state.session.is_some() {
        SurfaceState::Ready
    } else {
        SurfaceState::Empty
    };
    state.surface = SurfaceState::Failed;
    state.last_failure = Some(FailedAttempt {
        attempt,
        error: error.to_string(),
        prior_state,
    });
    error
}

fn intro_message(mode: ProcessingMode) -> String {
    let what = match mode {
        ProcessingMode::Simplify => "simplification",
        ProcessingMode::Summarize => "summary",
        ProcessingMode::GenerateQa => "set of questions and answers",
    };
    format!(
        "This is the initial {what}. You can ask me to refine it further (e.g., 'make it shorter', 'explain the first bullet point')."
    )
}
