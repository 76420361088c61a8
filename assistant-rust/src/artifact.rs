use crate::ProcessingResult;
use chrono::{DateTime, Utc};
use futures::lock::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// The current best output of a refinement surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub heading: Option<String>,
    pub body: String,
    /// Starts at 1 and increases with every replacement.
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<Artifact>>>;

/// Write access to an artifact. There is exactly one handle per artifact and
/// it cannot be cloned.
#[derive(Default)]
pub struct ArtifactHandle {
    slot: Slot,
    last_version: u32,
}

/// Read-only access to an artifact. Always observes the latest value.
#[derive(Clone)]
pub struct ArtifactView {
    slot: Slot,
}

impl ArtifactHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn view(&self) -> ArtifactView {
        ArtifactView {
            slot: self.slot.clone(),
        }
    }

    pub async fn current(&self) -> Option<Artifact> {
        self.slot.lock().await.clone()
    }

    /// Replace the artifact with `result` under the next version.
    pub async fn replace(&mut self, result: ProcessingResult) -> Artifact {
        self.last_version += 1;
        let artifact = Artifact {
            heading: result.heading,
            body: result.body,
            version: self.last_version,
            updated_at: Utc::now(),
        };
        *self.slot.lock().await = Some(artifact.clone());
        artifact
    }
}

impl ArtifactView {
    pub async fn current(&self) -> Option<Artifact> {
        self.slot.lock().await.clone()
    }

    /// The current body, `None` before the first generation.
    pub async fn body(&self) -> Option<String> {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|artifact| artifact.body.clone())
    }
}
