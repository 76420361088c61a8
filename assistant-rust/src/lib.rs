mod artifact;
mod composer;
mod config;
mod errors;
mod export;
mod in_flight;
mod instruction;
mod ocr;
mod params;
mod refinement;
mod schema;
mod study_chat;
mod text;
mod types;

pub use artifact::{Artifact, ArtifactHandle, ArtifactView};
pub use composer::{ComposedPrompt, Composer};
pub use config::AssistantConfig;
pub use errors::{AssistantError, GenerationFailure};
pub use export::{markdown_file_name, to_line_break_markup, to_markdown};
pub use instruction::InstructionParam;
pub use ocr::{CleanupAction, OcrSession};
pub use params::ComposerParams;
pub use refinement::{Attempt, FailedAttempt, RefinementController, SurfaceState};
pub use study_chat::StudyChatController;
pub use text::normalize_body;
pub use types::*;
