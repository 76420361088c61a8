use crate::{
    in_flight::{InFlight, InFlightGuard},
    AssistantError, Composer, OutputFormat, ProcessingMode, ProcessingRequest,
};
use futures::lock::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// AI clean-up applied to the editable OCR text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    Clean,
    Revise,
    Shorten,
}

impl CleanupAction {
    #[must_use]
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Clean => "Clean up any OCR errors and improve readability of the text, maintaining original meaning and style.",
            Self::Revise => "Revise the text for clarity, conciseness, and improved grammar, while preserving the core message.",
            Self::Shorten => "Shorten the text significantly, creating a concise summary. Output as plain text, not bullet points, suitable for direct editing.",
        }
    }
}

#[derive(Default)]
struct OcrState {
    extracted_text: String,
    editable_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OcrActivity {
    Extracting,
    Cleaning,
}

impl OcrActivity {
    fn busy(self) -> AssistantError {
        match self {
            Self::Extracting => AssistantError::Busy("ocr"),
            Self::Cleaning => AssistantError::Busy("cleanup"),
        }
    }
}

/// Text extracted from an image plus an editable copy the user and the
/// clean-up actions work on.
pub struct OcrSession {
    composer: Arc<Composer>,
    in_flight: InFlight<OcrActivity>,
    state: Mutex<OcrState>,
}

impl OcrSession {
    #[must_use]
    pub fn new(composer: Arc<Composer>) -> Self {
        Self {
            composer,
            in_flight: InFlight::new(),
            state: Mutex::new(OcrState::default()),
        }
    }

    /// Text as returned by the last successful extraction.
    pub async fn extracted_text(&self) -> String {
        self.state.lock().await.extracted_text.clone()
    }

    pub async fn editable_text(&self) -> String {
        self.state.lock().await.editable_text.clone()
    }

    /// Replace the editable text with a manual edit.
    pub async fn set_editable_text(&self, text: impl Into<String>) -> Result<(), AssistantError> {
        if let Some(activity) = self.in_flight.current() {
            return Err(activity.busy());
        }
        self.state.lock().await.editable_text = text.into();
        Ok(())
    }

    /// Run OCR on an image `data:` URI. The editable text is reset to the
    /// extracted text.
    pub async fn extract(&self, image_data_uri: &str) -> Result<String, AssistantError> {
        let _in_flight = self.begin(OcrActivity::Extracting)?;
        let result = self.composer.extract_text(image_data_uri).await;

        let mut state = self.state.lock().await;
        let text = result.inspect_err(|error| warn!(error = %error, "text extraction failed"))?;
        debug!(chars = text.len(), "text extracted");
        state.extracted_text.clone_from(&text);
        state.editable_text.clone_from(&text);
        Ok(text)
    }

    /// Apply a clean-up action to the editable text and replace it with the
    /// result.
    pub async fn apply(&self, action: CleanupAction) -> Result<String, AssistantError> {
        let _in_flight = self.begin(OcrActivity::Cleaning)?;
        let request = {
            let state = self.state.lock().await;
            if state.editable_text.trim().is_empty() {
                return Err(AssistantError::InputMissing("editable text"));
            }

            let source_text = if state.extracted_text.trim().is_empty() {
                state.editable_text.clone()
            } else {
                state.extracted_text.clone()
            };
            ProcessingRequest::new(source_text, ProcessingMode::Simplify, OutputFormat::StoryFormat)
                .refine(state.editable_text.clone(), None, action.instruction())
        };

        debug!(?action, "applying clean-up action");
        let result = self.composer.process(&request).await;

        let mut state = self.state.lock().await;
        let result =
            result.inspect_err(|error| warn!(error = %error, ?action, "clean-up action failed"))?;
        state.editable_text.clone_from(&result.body);
        Ok(result.body)
    }

    fn begin(
        &self,
        activity: OcrActivity,
    ) -> Result<InFlightGuard<'_, OcrActivity>, AssistantError> {
        self.in_flight.begin(activity).map_err(OcrActivity::busy)
    }
}
