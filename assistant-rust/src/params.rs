use crate::Composer;
use study_sdk::LanguageModel;
use std::sync::Arc;

/// Parameters required to create a composer.
/// # Default Values
/// - `with_heading`: `false`
/// - `temperature`: `None`
/// - `max_tokens`: `None`
/// - `restrict_study_topics`: `false`
pub struct ComposerParams {
    /// The language model every composed prompt is sent to.
    pub model: Arc<dyn LanguageModel>,
    /// Ask the model for a short heading alongside the body and thread it
    /// through refinements.
    pub with_heading: bool,
    /// Amount of randomness injected into the response. Ranges from 0.0 to 1.0
    pub temperature: Option<f64>,
    /// The maximum number of tokens that can be generated per call.
    pub max_tokens: Option<u32>,
    /// Make the study chat decline questions unrelated to studying.
    pub restrict_study_topics: bool,
}

impl ComposerParams {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            with_heading: false,
            temperature: None,
            max_tokens: None,
            restrict_study_topics: false,
        }
    }

    /// Track a generated heading next to the body
    #[must_use]
    pub fn with_heading(mut self, with_heading: bool) -> Self {
        self.with_heading = with_heading;
        self
    }

    /// Set the temperature for sampling
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Keep the study chat on study-related topics
    #[must_use]
    pub fn restrict_study_topics(mut self, restrict: bool) -> Self {
        self.restrict_study_topics = restrict;
        self
    }

    #[must_use]
    pub fn build(self) -> Composer {
        Composer::new(self)
    }
}
