use crate::{
    instruction::{self, InstructionParam},
    normalize_body, schema, AssistantError, ChatRole, ComposerParams, GenerationFailure,
    OutputFormat, ProcessingMode, ProcessingRequest, ProcessingResult, StudyChatRequest,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use study_sdk::{
    data_uri, LanguageModel, LanguageModelError, LanguageModelInput, Message, Part,
    ResponseFormatJson, ResponseFormatOption, UserMessage,
};
use tracing::{debug, info_span, warn, Instrument};

const EMPHASIS_RULE: &str = "When you generate text that requires emphasis or bolding, you MUST use HTML <strong> tags (e.g., <strong>This is important</strong>). Do NOT use Markdown like **important**.";

const COMMON_INSTRUCTIONS: &str = "Ensure clarity, accuracy, and appropriate detail. Remember to use <strong> tags for any bold text.";

/// A fully rendered model call, inspectable before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    /// Stable name of the prompt template, e.g. `process_text`.
    pub name: &'static str,
    pub system_prompt: String,
    /// Content of the single user message.
    pub content: Vec<Part>,
    pub response_format: ResponseFormatJson,
}

/// Turns structured requests into model calls and parses what comes back.
///
/// The composer holds no conversation state. Everything it needs arrives in
/// the request.
pub struct Composer {
    model: Arc<dyn LanguageModel>,
    with_heading: bool,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    restrict_study_topics: bool,
}

#[derive(Debug, Clone, Copy)]
struct ProcessingPlan {
    mode: ProcessingMode,
    format: OutputFormat,
    refining: bool,
    with_heading: bool,
    has_prior_heading: bool,
}

#[derive(Debug, Clone, Copy)]
struct StudyChatPlan {
    has_notes: bool,
    has_history: bool,
    restrict_topics: bool,
}

#[derive(Deserialize)]
struct ProcessingOutput {
    body: String,
    #[serde(default)]
    heading: Option<String>,
}

#[derive(Deserialize)]
struct StudyChatOutput {
    answer: String,
}

#[derive(Deserialize)]
struct ExtractTextOutput {
    extracted_text: String,
}

impl Composer {
    #[must_use]
    pub fn new(params: ComposerParams) -> Self {
        Self {
            model: params.model,
            with_heading: params.with_heading,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            restrict_study_topics: params.restrict_study_topics,
        }
    }

    /// Whether processing results carry a heading.
    #[must_use]
    pub fn with_heading(&self) -> bool {
        self.with_heading
    }

    /// Render a process or refine request without calling the model.
    pub fn compose_processing(
        &self,
        request: &ProcessingRequest,
    ) -> Result<ComposedPrompt, AssistantError> {
        let refining = request.is_refinement();
        if refining {
            let instruction = request.refinement_instruction.as_deref().unwrap_or_default();
            if instruction.trim().is_empty() {
                return Err(AssistantError::InputMissing("refinement instruction"));
            }
            if request
                .prior_body
                .as_deref()
                .is_none_or(|body| body.trim().is_empty())
            {
                return Err(AssistantError::InputMissing("prior body"));
            }
        } else if request.source_text.trim().is_empty() {
            return Err(AssistantError::InputMissing("source text"));
        }

        let prior_heading = request
            .prior_heading
            .as_deref()
            .map(str::trim)
            .filter(|heading| self.with_heading && !heading.is_empty());

        let plan = ProcessingPlan {
            mode: request.mode,
            format: request.format,
            refining,
            with_heading: self.with_heading,
            has_prior_heading: refining && prior_heading.is_some(),
        };

        debug!(
            mode = %plan.mode,
            format = %plan.format,
            refining,
            with_heading = plan.with_heading,
            "composing processing prompt"
        );

        let mut sections = Vec::new();
        if refining {
            if !request.source_text.trim().is_empty() {
                sections.push(format!(
                    "Original text (for context, if needed):\n{}",
                    request.source_text
                ));
            }
            if let Some(heading) = prior_heading {
                sections.push(format!("Previous heading:\n{heading}"));
            }
            sections.push(format!(
                "Previous processed text:\n{}",
                request.prior_body.as_deref().unwrap_or_default()
            ));
            sections.push(format!(
                "Refinement instruction:\n{}",
                request
                    .refinement_instruction
                    .as_deref()
                    .unwrap_or_default()
            ));
        } else {
            sections.push(format!("Text:\n{}", request.source_text));
        }

        Ok(ComposedPrompt {
            name: if refining { "refine_text" } else { "process_text" },
            system_prompt: instruction::get_prompt(&processing_instructions(), &plan),
            content: vec![Part::text(sections.join("\n\n"))],
            response_format: schema::processing_format(self.with_heading),
        })
    }

    /// Render a study chat question without calling the model.
    pub fn compose_study_chat(
        &self,
        request: &StudyChatRequest,
    ) -> Result<ComposedPrompt, AssistantError> {
        if request.question.trim().is_empty() {
            return Err(AssistantError::InputMissing("question"));
        }

        let notes = request
            .notes
            .as_deref()
            .filter(|notes| !notes.trim().is_empty());

        let history = request
            .history
            .iter()
            .filter_map(|turn| match turn.role {
                ChatRole::User => Some(format!("User: {}", turn.content)),
                ChatRole::Assistant => Some(format!("AI: {}", turn.content)),
                ChatRole::System => None,
            })
            .collect::<Vec<_>>();

        let plan = StudyChatPlan {
            has_notes: notes.is_some(),
            has_history: !history.is_empty(),
            restrict_topics: self.restrict_study_topics,
        };

        debug!(
            has_notes = plan.has_notes,
            history_turns = history.len(),
            "composing study chat prompt"
        );

        let mut sections = Vec::new();
        if plan.has_history {
            sections.push(format!(
                "Conversation History:\n{}\n---",
                history.join("\n")
            ));
        }
        if let Some(notes) = notes {
            sections.push(format!("Notes:\n{notes}"));
        }
        sections.push(format!("Current Question:\n{}", request.question));

        Ok(ComposedPrompt {
            name: "study_chat",
            system_prompt: instruction::get_prompt(&study_chat_instructions(), &plan),
            content: vec![Part::text(sections.join("\n\n"))],
            response_format: schema::study_chat_format(),
        })
    }

    /// Render an OCR call for an image given as a `data:` URI.
    pub fn compose_extract_text(
        &self,
        image_data_uri: &str,
    ) -> Result<ComposedPrompt, AssistantError> {
        if image_data_uri.trim().is_empty() {
            return Err(AssistantError::InputMissing("image"));
        }

        if self
            .model
            .metadata()
            .is_some_and(|metadata| !metadata.image_input)
        {
            return Err(GenerationFailure::Model(LanguageModelError::Unsupported(
                self.model.provider(),
                format!("{} does not accept image input", self.model.model_id()),
            ))
            .into());
        }

        let image = data_uri::parse_image_data_uri(image_data_uri)
            .map_err(|error| AssistantError::InvalidRequest(error.to_string()))?;

        debug!(mime_type = %image.mime_type, "composing extract text prompt");

        Ok(ComposedPrompt {
            name: "extract_text",
            system_prompt: [
                "You are an OCR assistant for students' handwritten and printed notes.",
                "Extract all text visible in the image exactly as written, in reading order, keeping paragraphs and line breaks.",
                "Do not summarize or add commentary. If the image contains no text, return an empty string.",
            ]
            .join("\n"),
            content: vec![
                Part::text("Extract the text from this image."),
                Part::Image(image),
            ],
            response_format: schema::extract_text_format(),
        })
    }

    /// Process or refine text. The body of the result is normalized.
    pub async fn process(
        &self,
        request: &ProcessingRequest,
    ) -> Result<ProcessingResult, AssistantError> {
        let prompt = self.compose_processing(request)?;
        let output: ProcessingOutput = self.generate_json(prompt).await?;

        let body = normalize_body(&output.body);
        if body.is_empty() {
            return Err(GenerationFailure::InvalidOutput("the body is empty".to_string()).into());
        }

        let heading = if self.with_heading {
            output
                .heading
                .map(|heading| heading.trim().to_string())
                .filter(|heading| !heading.is_empty())
        } else {
            None
        };

        Ok(ProcessingResult { heading, body })
    }

    /// Answer a study question.
    pub async fn answer(&self, request: &StudyChatRequest) -> Result<String, AssistantError> {
        let prompt = self.compose_study_chat(request)?;
        let output: StudyChatOutput = self.generate_json(prompt).await?;

        let answer = normalize_body(&output.answer);
        if answer.is_empty() {
            return Err(
                GenerationFailure::InvalidOutput("the answer is empty".to_string()).into(),
            );
        }
        Ok(answer)
    }

    /// Read the text in an image. An image without text yields an empty string.
    pub async fn extract_text(&self, image_data_uri: &str) -> Result<String, AssistantError> {
        let prompt = self.compose_extract_text(image_data_uri)?;
        let output: ExtractTextOutput = self.generate_json(prompt).await?;
        Ok(output.extracted_text.trim().to_string())
    }

    /// Models that do not enforce the schema on the provider side get it
    /// spelled out in the system prompt.
    fn to_input(&self, prompt: ComposedPrompt) -> LanguageModelInput {
        let mut system_prompt = prompt.system_prompt;
        if self
            .model
            .metadata()
            .is_some_and(|metadata| !metadata.structured_output)
        {
            if let Some(schema) = &prompt.response_format.schema {
                system_prompt = format!(
                    "{system_prompt}\nRespond only with a JSON object that matches this JSON schema:\n{schema}"
                );
            }
        }

        LanguageModelInput {
            system_prompt: Some(system_prompt),
            messages: vec![Message::User(UserMessage {
                content: prompt.content,
            })],
            response_format: Some(ResponseFormatOption::Json(prompt.response_format)),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..Default::default()
        }
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: ComposedPrompt,
    ) -> Result<T, AssistantError> {
        let name = prompt.name;
        let span = info_span!("study_assistant.generate", prompt = name);
        let input = self.to_input(prompt);

        let result = async {
            let response = self
                .model
                .generate(input)
                .await
                .map_err(GenerationFailure::Model)?;

            let text = response.text().ok_or_else(|| {
                GenerationFailure::InvalidOutput("the model returned no text".to_string())
            })?;

            serde_json::from_str::<T>(&text).map_err(|error| {
                GenerationFailure::InvalidOutput(format!(
                    "response does not match the {name} schema: {error}"
                ))
            })
        }
        .instrument(span)
        .await;

        result.map_err(|failure| {
            warn!(prompt = name, error = %failure, "generation failed");
            AssistantError::GenerationFailure(failure)
        })
    }
}

fn processing_instructions() -> Vec<InstructionParam<ProcessingPlan>> {
    vec![
        "You are an AI expert in text processing for students.".into(),
        EMPHASIS_RULE.into(),
        InstructionParam::when(
            |plan: &ProcessingPlan| plan.refining,
            InstructionParam::Func(refinement_task),
        ),
        InstructionParam::when(
            |plan: &ProcessingPlan| !plan.refining,
            InstructionParam::Func(initial_task),
        ),
        InstructionParam::when(
            |plan: &ProcessingPlan| plan.with_heading && !plan.has_prior_heading,
            "Also write a short, descriptive heading for the text in the `heading` field. Do not repeat the heading at the start of `body`.",
        ),
        InstructionParam::when(
            |plan: &ProcessingPlan| plan.with_heading && plan.has_prior_heading,
            "The previous heading is included in the user message. Return it unchanged in the `heading` field if it still fits the refined text, or write a better one if the refinement changed its focus.",
        ),
        COMMON_INSTRUCTIONS.into(),
        "Return the processed text in the `body` field.".into(),
    ]
}

fn initial_task(plan: &ProcessingPlan) -> String {
    let goal = match plan.mode {
        ProcessingMode::Simplify => "<strong>simplify</strong> this text",
        ProcessingMode::Summarize => "<strong>summarize</strong> this text",
        ProcessingMode::GenerateQa => "<strong>study questions and answers</strong> about this text",
    };
    format!(
        "Process the text in the user message based on the user's request.\nThe user wants {goal}, written as <strong>{}</strong>.\nInstructions: {}",
        plan.format.description(),
        branch_instructions(plan.mode, plan.format)
    )
}

fn refinement_task(plan: &ProcessingPlan) -> String {
    let done = match plan.mode {
        ProcessingMode::Simplify => "simplified",
        ProcessingMode::Summarize => "summarized",
        ProcessingMode::GenerateQa => "turned into questions and answers",
    };
    let format = plan.format.description();
    format!(
        "You are refining a previously processed text. It was {done} into {format}.\nThe user message contains the original text for context, the previous processed text and the user's refinement instruction.\nApply the instruction to the previous processed text and return the complete new text, keeping the same format ({format}). Build on the previous processed text, not on the original text.\nFormat guidance: {}",
        branch_instructions(plan.mode, plan.format)
    )
}

/// Instructions for each mode and format pair. Exactly one applies per
/// request.
fn branch_instructions(mode: ProcessingMode, format: OutputFormat) -> &'static str {
    match (mode, format) {
        (ProcessingMode::Simplify, OutputFormat::BulletPoints) => {
            "Generate comprehensive and informative bullet points. Each bullet point should be well-explained and detailed, so it can be understood on its own. Sub-bullets can be used for further detail."
        }
        (ProcessingMode::Simplify, OutputFormat::StoryFormat) => {
            "Create an engaging narrative that explains the core concepts from the text clearly and thoroughly, in simple language."
        }
        (ProcessingMode::Summarize, OutputFormat::BulletPoints) => {
            "Generate condensed but complete bullet points. Sub-bullets can be used if it helps clarity and depth. The summary should be a thorough representation of the original notes."
        }
        (ProcessingMode::Summarize, OutputFormat::StoryFormat) => {
            "Create a condensed narrative that accurately captures the key information and concepts from the notes. It should be detailed enough to be informative while remaining coherent and easy to follow."
        }
        (ProcessingMode::GenerateQa, OutputFormat::BulletPoints) => {
            "Generate question and answer pairs that cover the key concepts of the text. Put each pair in its own bullet point, starting with <strong>Question:</strong> followed by <strong>Answer:</strong>, alternating question then answer."
        }
        (ProcessingMode::GenerateQa, OutputFormat::StoryFormat) => {
            "Write a flowing narrative that interleaves questions and answers: pose a question about a key concept, then answer it in the following sentences before moving on to the next question."
        }
    }
}

fn study_chat_instructions() -> Vec<InstructionParam<StudyChatPlan>> {
    vec![
        "You are a helpful study assistant. Your goal is to answer the user's question accurately and concisely.".into(),
        InstructionParam::when(
            |plan: &StudyChatPlan| plan.has_history,
            "Consider the conversation history in the user message for context.",
        ),
        InstructionParam::when(
            |plan: &StudyChatPlan| plan.has_notes,
            "First, check if the provided Notes contain information relevant to the current question. If they do, prioritize using that information in your answer.\nIf the Notes do not contain the answer, or only partially cover it, you MUST use your general knowledge to provide a comprehensive and precise answer. Do not simply state that the information is not in the notes if you can answer it from general knowledge.",
        ),
        InstructionParam::when(
            |plan: &StudyChatPlan| !plan.has_notes,
            "No notes were provided. Answer from your general knowledge with a comprehensive and precise answer.",
        ),
        InstructionParam::when(
            |plan: &StudyChatPlan| plan.restrict_topics,
            "Only help with study-related topics such as academic subjects, learning techniques and exam preparation. If the question is unrelated to studying, politely decline and suggest a study-related way you can help.",
        ),
        EMPHASIS_RULE.into(),
        "Return the answer in the `answer` field.".into(),
    ]
}
