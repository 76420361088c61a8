mod client_utils;
pub mod data_uri;
mod errors;
pub mod google;
mod language_model;
pub mod openai;
mod opentelemetry;
mod registry;
pub mod sdk_test;
mod types;
mod types_ext;

pub use errors::*;
pub use language_model::{LanguageModel, LanguageModelMetadata};
pub use registry::{LanguageModelRegistry, LanguageModelRegistryOptions, Provider};
pub use types::*;
