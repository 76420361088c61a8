use crate::{
    google::{GoogleModel, GoogleModelOptions},
    openai::{OpenAIChatModel, OpenAIChatModelOptions},
    LanguageModel, LanguageModelError, LanguageModelResult,
};
use std::{fmt, str::FromStr, sync::Arc};

/// Hosted providers the registry knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Google,
    OpenAI,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAI => "openai",
        }
    }

    /// Model used when the caller does not name one.
    #[must_use]
    pub fn default_model_id(self) -> &'static str {
        match self {
            Self::Google => "gemini-2.0-flash",
            Self::OpenAI => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LanguageModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" | "googleai" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            other => Err(LanguageModelError::InvalidInput(format!(
                "Unknown provider '{other}'. Supported: google, openai"
            ))),
        }
    }
}

/// Builds language models for a provider name and model ID from one set of
/// credentials.
pub struct LanguageModelRegistry {
    options: LanguageModelRegistryOptions,
}

#[derive(Clone, Default)]
pub struct LanguageModelRegistryOptions {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Overrides the provider base URL, e.g. for a proxy.
    pub base_url: Option<String>,
}

impl LanguageModelRegistry {
    #[must_use]
    pub fn new(options: LanguageModelRegistryOptions) -> Self {
        Self { options }
    }

    pub fn get_model(
        &self,
        provider: Provider,
        model_id: Option<&str>,
    ) -> LanguageModelResult<Arc<dyn LanguageModel>> {
        let model_id = model_id.unwrap_or_else(|| provider.default_model_id());
        tracing::debug!(%provider, model_id, "building language model");

        match provider {
            Provider::Google => {
                let api_key = self.options.google_api_key.clone().ok_or_else(|| {
                    LanguageModelError::InvalidInput("Missing Google API key".to_string())
                })?;
                Ok(Arc::new(GoogleModel::new(
                    model_id,
                    GoogleModelOptions {
                        api_key,
                        base_url: self.options.base_url.clone(),
                        ..Default::default()
                    },
                )))
            }
            Provider::OpenAI => {
                let api_key = self.options.openai_api_key.clone().ok_or_else(|| {
                    LanguageModelError::InvalidInput("Missing OpenAI API key".to_string())
                })?;
                Ok(Arc::new(OpenAIChatModel::new(
                    model_id,
                    OpenAIChatModelOptions {
                        api_key,
                        base_url: self.options.base_url.clone(),
                        ..Default::default()
                    },
                )))
            }
        }
    }
}
