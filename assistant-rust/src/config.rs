use crate::{AssistantError, ComposerParams};
use std::{env, sync::Arc};
use study_sdk::{LanguageModel, LanguageModelRegistry, LanguageModelRegistryOptions, Provider};

/// Settings needed to build a composer against a hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    pub provider: Provider,
    /// Falls back to the provider's default model.
    pub model_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub with_heading: bool,
    pub temperature: Option<f64>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Google,
            model_id: None,
            api_key: None,
            base_url: None,
            with_heading: true,
            temperature: None,
        }
    }
}

impl AssistantConfig {
    /// Read the configuration from process environment variables.
    ///
    /// `STUDY_PROVIDER`, `STUDY_MODEL`, `STUDY_BASE_URL`, `STUDY_HEADINGS`,
    /// `STUDY_TEMPERATURE`, and `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) or
    /// `OPENAI_API_KEY` depending on the provider.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let provider = match var("STUDY_PROVIDER") {
            Some(value) => value
                .parse::<Provider>()
                .map_err(|error| AssistantError::Config(error.to_string()))?,
            None => Provider::default(),
        };

        let api_key = match provider {
            Provider::Google => var("GOOGLE_API_KEY").or_else(|| var("GEMINI_API_KEY")),
            Provider::OpenAI => var("OPENAI_API_KEY"),
        };

        let with_heading = match var("STUDY_HEADINGS") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                AssistantError::Config(format!("STUDY_HEADINGS must be true or false, got '{value}'"))
            })?,
            None => true,
        };

        let temperature = var("STUDY_TEMPERATURE")
            .map(|value| {
                value.trim().parse::<f64>().map_err(|error| {
                    AssistantError::Config(format!("Invalid STUDY_TEMPERATURE '{value}': {error}"))
                })
            })
            .transpose()?;

        Ok(Self {
            provider,
            model_id: var("STUDY_MODEL"),
            api_key,
            base_url: var("STUDY_BASE_URL"),
            with_heading,
            temperature,
        })
    }

    /// Build the configured model.
    pub fn build_model(&self) -> Result<Arc<dyn LanguageModel>, AssistantError> {
        let mut options = LanguageModelRegistryOptions {
            base_url: self.base_url.clone(),
            ..Default::default()
        };
        match self.provider {
            Provider::Google => options.google_api_key.clone_from(&self.api_key),
            Provider::OpenAI => options.openai_api_key.clone_from(&self.api_key),
        }

        LanguageModelRegistry::new(options)
            .get_model(self.provider, self.model_id.as_deref())
            .map_err(|error| AssistantError::Config(error.to_string()))
    }

    /// Composer parameters for the configured model.
    pub fn composer_params(&self) -> Result<ComposerParams, AssistantError> {
        let mut params = ComposerParams::new(self.build_model()?).with_heading(self.with_heading);
        if let Some(temperature) = self.temperature {
            params = params.temperature(temperature);
        }
        Ok(params)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
