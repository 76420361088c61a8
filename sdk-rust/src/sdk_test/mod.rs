//! Test doubles for code that talks to a [`LanguageModel`](crate::LanguageModel).

mod model;

pub use model::{MockGenerateResult, MockLanguageModel};
