use study_sdk::LanguageModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    /// A required field was empty. Raised before any model call.
    #[error("Missing input: {0}")]
    InputMissing(&'static str),
    /// The request is well-formed but not valid for the current state.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The surface already has a model call in flight.
    #[error("The {0} surface is busy with another request")]
    Busy(&'static str),
    #[error("Generation failed: {0}")]
    GenerationFailure(#[source] GenerationFailure),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a model call did not yield a usable result.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("Language model error: {0}")]
    Model(#[from] LanguageModelError),
    /// The model answered but the output did not match the declared shape.
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

impl From<GenerationFailure> for AssistantError {
    fn from(value: GenerationFailure) -> Self {
        Self::GenerationFailure(value)
    }
}

impl From<LanguageModelError> for AssistantError {
    fn from(value: LanguageModelError) -> Self {
        Self::GenerationFailure(GenerationFailure::Model(value))
    }
}
