use crate::{LanguageModelInput, LanguageModelResult, ModelResponse};
use futures::future::BoxFuture;

#[derive(Debug, Clone, Default)]
pub struct LanguageModelMetadata {
    /// Whether the provider enforces the JSON schema passed in
    /// `response_format` on its side.
    pub structured_output: bool,
    /// Whether the model accepts image parts in user messages.
    pub image_input: bool,
}

/// A hosted model that turns one `LanguageModelInput` into one response.
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> &'static str;
    fn model_id(&self) -> String;
    fn metadata(&self) -> Option<&LanguageModelMetadata> {
        None
    }
    fn generate(&self, input: LanguageModelInput)
        -> BoxFuture<'_, LanguageModelResult<ModelResponse>>;
}
