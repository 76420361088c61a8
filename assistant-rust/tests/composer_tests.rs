use serde_json::{json, Value};
use std::sync::Arc;
use study_assistant::{
    AssistantError, ChatTurn, Composer, ComposerParams, GenerationFailure, OutputFormat,
    ProcessingMode, ProcessingRequest, StudyChatRequest,
};
use study_sdk::{
    sdk_test::{MockGenerateResult, MockLanguageModel},
    LanguageModelError, LanguageModelInput, LanguageModelMetadata, Message, ModelResponse, Part,
    ResponseFormatOption,
};

const PHOTOSYNTHESIS: &str = "Photosynthesis is the process by which green plants use sunlight, water and carbon dioxide to make glucose. Oxygen is released as a byproduct.";

fn json_response(value: Value) -> ModelResponse {
    ModelResponse {
        content: vec![Part::text(value.to_string())],
        ..Default::default()
    }
}

fn composer(model: &Arc<MockLanguageModel>) -> Composer {
    ComposerParams::new(model.clone()).build()
}

fn user_text(input: &LanguageModelInput) -> String {
    match &input.messages[0] {
        Message::User(user) => user
            .content
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join(""),
        Message::Assistant(_) => panic!("expected a user message"),
    }
}

#[tokio::test]
async fn simplify_bullet_points_returns_normalized_strong_bullets() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(json_response(json!({
        "body": "\n\n* <strong>Photosynthesis</strong> turns light into food.\n\n\n\n* Plants release <strong>oxygen</strong>.  \n"
    })));

    let result = composer(&model)
        .process(&ProcessingRequest::new(
            PHOTOSYNTHESIS,
            ProcessingMode::Simplify,
            OutputFormat::BulletPoints,
        ))
        .await
        .expect("process should succeed");

    assert_eq!(
        result.body,
        "* <strong>Photosynthesis</strong> turns light into food.\n\n* Plants release <strong>oxygen</strong>."
    );
    assert_eq!(result.heading, None);

    let inputs = model.tracked_generate_inputs();
    assert_eq!(inputs.len(), 1);
    let input = &inputs[0];
    let system_prompt = input.system_prompt.as_deref().unwrap();
    assert!(system_prompt.contains("you MUST use HTML <strong> tags"));
    assert!(system_prompt.contains("Do NOT use Markdown like **important**"));
    assert!(system_prompt.contains("<strong>simplify</strong> this text"));
    assert!(system_prompt.contains("<strong>bullet points</strong>"));
    assert!(!system_prompt.contains("You are refining"));
    assert_eq!(user_text(input), format!("Text:\n{PHOTOSYNTHESIS}"));

    match &input.response_format {
        Some(ResponseFormatOption::Json(format)) => {
            assert_eq!(format.name, "processed_text");
            let schema = format.schema.as_ref().unwrap();
            assert_eq!(schema["required"], json!(["body"]));
        }
        other => panic!("expected a JSON response format, got {other:?}"),
    }
}

#[tokio::test]
async fn composition_is_deterministic_per_branch() {
    let model = Arc::new(MockLanguageModel::new());
    let composer = composer(&model);

    let modes = [
        ProcessingMode::Simplify,
        ProcessingMode::Summarize,
        ProcessingMode::GenerateQa,
    ];
    let formats = [OutputFormat::BulletPoints, OutputFormat::StoryFormat];

    let mut prompts = Vec::new();
    for mode in modes {
        for format in formats {
            let request = ProcessingRequest::new(PHOTOSYNTHESIS, mode, format);
            let first = composer.compose_processing(&request).unwrap();
            let second = composer.compose_processing(&request).unwrap();
            assert_eq!(first, second);
            prompts.push(first.system_prompt);
        }
    }

    for (i, a) in prompts.iter().enumerate() {
        for b in prompts.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
    assert!(model.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn generate_qa_bullets_ask_for_question_answer_pairs() {
    let model = Arc::new(MockLanguageModel::new());
    let prompt = composer(&model)
        .compose_processing(&ProcessingRequest::new(
            PHOTOSYNTHESIS,
            ProcessingMode::GenerateQa,
            OutputFormat::BulletPoints,
        ))
        .unwrap();

    assert_eq!(prompt.name, "process_text");
    assert!(prompt.system_prompt.contains("<strong>Question:</strong>"));
    assert!(prompt.system_prompt.contains("<strong>Answer:</strong>"));
}

#[tokio::test]
async fn refinement_prompt_carries_source_prior_and_instruction() {
    let model = Arc::new(MockLanguageModel::new());
    let request = ProcessingRequest::new(
        PHOTOSYNTHESIS,
        ProcessingMode::Summarize,
        OutputFormat::StoryFormat,
    )
    .refine("Plants make food from light.", None, "make it shorter");

    let prompt = composer(&model).compose_processing(&request).unwrap();

    assert_eq!(prompt.name, "refine_text");
    assert!(prompt.system_prompt.contains("You are refining a previously processed text"));
    assert!(prompt.system_prompt.contains("summarized into a story format"));
    assert!(prompt.system_prompt.contains("keeping the same format (a story format)"));
    assert!(!prompt.system_prompt.contains("<strong>summarize</strong> this text"));

    let Part::Text(text) = &prompt.content[0] else {
        panic!("expected text content");
    };
    assert_eq!(
        text.text,
        format!(
            "Original text (for context, if needed):\n{PHOTOSYNTHESIS}\n\nPrevious processed text:\nPlants make food from light.\n\nRefinement instruction:\nmake it shorter"
        )
    );
}

#[tokio::test]
async fn missing_inputs_fail_before_any_model_call() {
    let model = Arc::new(MockLanguageModel::new());
    let composer = composer(&model);

    let err = composer
        .process(&ProcessingRequest::new(
            "   ",
            ProcessingMode::Simplify,
            OutputFormat::BulletPoints,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InputMissing("source text")));

    let err = composer
        .process(
            &ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Simplify, OutputFormat::BulletPoints)
                .refine("prior", None, "  "),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InputMissing("refinement instruction")));

    let mut request =
        ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Simplify, OutputFormat::BulletPoints);
    request.refinement_instruction = Some("make it shorter".to_string());
    let err = composer.process(&request).await.unwrap_err();
    assert!(matches!(err, AssistantError::InputMissing("prior body")));

    assert!(model.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn prior_fields_without_instruction_are_an_initial_generation() {
    let model = Arc::new(MockLanguageModel::new());
    let mut request =
        ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Simplify, OutputFormat::StoryFormat);
    request.prior_body = Some("old body".to_string());
    assert!(!request.is_refinement());

    let prompt = composer(&model).compose_processing(&request).unwrap();
    assert_eq!(prompt.name, "process_text");
    assert!(!prompt.system_prompt.contains("You are refining"));

    let request = request.refine("old body", None, "make it shorter");
    assert!(request.is_refinement());
    let prompt = composer(&model).compose_processing(&request).unwrap();
    assert_eq!(prompt.name, "refine_text");
}

#[tokio::test]
async fn heading_is_trimmed_and_empty_heading_is_none() {
    let model = Arc::new(MockLanguageModel::new());
    model
        .enqueue_generate(json_response(json!({
            "heading": "  Photosynthesis Basics ",
            "body": "Plants make <strong>glucose</strong>."
        })))
        .enqueue_generate(json_response(json!({
            "heading": "",
            "body": "Plants make <strong>glucose</strong>."
        })))
        .enqueue_generate(json_response(json!({
            "body": "Plants make <strong>glucose</strong>."
        })));

    let composer = ComposerParams::new(model.clone()).with_heading(true).build();
    let request =
        ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Simplify, OutputFormat::StoryFormat);

    let first = composer.process(&request).await.unwrap();
    assert_eq!(first.heading.as_deref(), Some("Photosynthesis Basics"));

    let second = composer.process(&request).await.unwrap();
    assert_eq!(second.heading, None);

    let third = composer.process(&request).await.unwrap();
    assert_eq!(third.heading, None);
    assert_eq!(third.body, "Plants make <strong>glucose</strong>.");

    let input = &model.tracked_generate_inputs()[0];
    assert!(input
        .system_prompt
        .as_deref()
        .unwrap()
        .contains("short, descriptive heading"));
    let Some(ResponseFormatOption::Json(format)) = &input.response_format else {
        panic!("expected JSON response format");
    };
    assert_eq!(
        format.schema.as_ref().unwrap()["required"],
        json!(["heading", "body"])
    );
}

#[tokio::test]
async fn refinement_with_heading_offers_the_previous_heading() {
    let model = Arc::new(MockLanguageModel::new());
    let composer = ComposerParams::new(model.clone()).with_heading(true).build();

    let prompt = composer
        .compose_processing(
            &ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Simplify, OutputFormat::BulletPoints)
                .refine("* light", Some("Photosynthesis".to_string()), "add an example"),
        )
        .unwrap();

    assert!(prompt.system_prompt.contains("The previous heading is included"));
    let Part::Text(text) = &prompt.content[0] else {
        panic!("expected text content");
    };
    assert!(text.text.contains("Previous heading:\nPhotosynthesis"));
}

#[tokio::test]
async fn invalid_output_and_model_errors_are_generation_failures() {
    let model = Arc::new(MockLanguageModel::new());
    model
        .enqueue_generate(ModelResponse {
            content: vec![Part::text("Sure! Here are your notes.")],
            ..Default::default()
        })
        .enqueue_generate(json_response(json!({ "body": "  \n\n " })))
        .enqueue_generate(MockGenerateResult::error(LanguageModelError::Refusal(
            "blocked".to_string(),
        )));

    let composer = composer(&model);
    let request =
        ProcessingRequest::new(PHOTOSYNTHESIS, ProcessingMode::Summarize, OutputFormat::BulletPoints);

    let err = composer.process(&request).await.unwrap_err();
    assert!(matches!(
        err,
        AssistantError::GenerationFailure(GenerationFailure::InvalidOutput(_))
    ));

    let err = composer.process(&request).await.unwrap_err();
    assert!(matches!(
        err,
        AssistantError::GenerationFailure(GenerationFailure::InvalidOutput(_))
    ));

    let err = composer.process(&request).await.unwrap_err();
    assert!(matches!(
        err,
        AssistantError::GenerationFailure(GenerationFailure::Model(LanguageModelError::Refusal(_)))
    ));
}

#[tokio::test]
async fn study_chat_without_notes_uses_general_knowledge() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(json_response(json!({ "answer": "2 + 2 = <strong>4</strong>." })));

    let answer = composer(&model)
        .answer(&StudyChatRequest::new("What is 2+2?"))
        .await
        .unwrap();
    assert_eq!(answer, "2 + 2 = <strong>4</strong>.");

    let input = &model.tracked_generate_inputs()[0];
    let system_prompt = input.system_prompt.as_deref().unwrap();
    assert!(system_prompt.contains("No notes were provided"));
    assert!(!system_prompt.contains("prioritize using that information"));
    assert!(!system_prompt.contains("study-related topics"));

    let text = user_text(input);
    assert_eq!(text, "Current Question:\nWhat is 2+2?");
}

#[tokio::test]
async fn study_chat_threads_history_and_prioritizes_notes() {
    let model = Arc::new(MockLanguageModel::new());
    let composer = ComposerParams::new(model.clone())
        .restrict_study_topics(true)
        .build();

    let request = StudyChatRequest::new("And where does it happen?")
        .with_notes("Photosynthesis happens in chloroplasts.")
        .with_history(vec![
            ChatTurn::system("You can ask follow-up questions."),
            ChatTurn::user("What is photosynthesis?"),
            ChatTurn::assistant("Plants making food from light."),
        ]);

    let prompt = composer.compose_study_chat(&request).unwrap();

    assert!(prompt
        .system_prompt
        .contains("prioritize using that information"));
    assert!(prompt
        .system_prompt
        .contains("you MUST use your general knowledge"));
    assert!(prompt.system_prompt.contains("study-related topics"));
    assert!(prompt.system_prompt.contains("conversation history"));

    let Part::Text(text) = &prompt.content[0] else {
        panic!("expected text content");
    };
    assert_eq!(
        text.text,
        "Conversation History:\nUser: What is photosynthesis?\nAI: Plants making food from light.\n---\n\nNotes:\nPhotosynthesis happens in chloroplasts.\n\nCurrent Question:\nAnd where does it happen?"
    );
}

#[tokio::test]
async fn blank_question_is_missing_input() {
    let model = Arc::new(MockLanguageModel::new());
    let err = composer(&model)
        .answer(&StudyChatRequest::new(" "))
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InputMissing("question")));
    assert!(model.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn extract_text_sends_the_image() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(json_response(json!({ "extracted_text": "Chapter 1\nCells\n" })));

    let text = composer(&model)
        .extract_text("data:image/png;base64,aGVsbG8=")
        .await
        .unwrap();
    assert_eq!(text, "Chapter 1\nCells");

    let input = &model.tracked_generate_inputs()[0];
    let Message::User(user) = &input.messages[0] else {
        panic!("expected a user message");
    };
    assert_eq!(user.content[1], Part::image("aGVsbG8=", "image/png"));
    let Some(ResponseFormatOption::Json(format)) = &input.response_format else {
        panic!("expected JSON response format");
    };
    assert_eq!(format.name, "extracted_text");
}

#[tokio::test]
async fn extract_text_rejects_bad_data_uris() {
    let model = Arc::new(MockLanguageModel::new());
    let composer = composer(&model);

    let err = composer
        .extract_text("https://example.com/page.png")
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InvalidRequest(_)));

    let err = composer.extract_text("").await.unwrap_err();
    assert!(matches!(err, AssistantError::InputMissing("image")));

    assert!(model.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn text_only_model_cannot_extract_text() {
    let mut model = MockLanguageModel::new();
    model.set_metadata(Some(LanguageModelMetadata {
        structured_output: true,
        image_input: false,
    }));
    let model = Arc::new(model);

    let err = composer(&model)
        .extract_text("data:image/png;base64,aGVsbG8=")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AssistantError::GenerationFailure(GenerationFailure::Model(
            LanguageModelError::Unsupported("mock", _)
        ))
    ));
    assert!(model.tracked_generate_inputs().is_empty());
}

#[tokio::test]
async fn schema_is_spelled_out_for_models_without_structured_output() {
    let mut model = MockLanguageModel::new();
    model.set_metadata(Some(LanguageModelMetadata {
        structured_output: false,
        image_input: true,
    }));
    let model = Arc::new(model);
    model.enqueue_generate(json_response(json!({ "answer": "Chlorophyll absorbs light." })));

    composer(&model)
        .answer(&StudyChatRequest::new("What absorbs light in a leaf?"))
        .await
        .unwrap();

    let input = &model.tracked_generate_inputs()[0];
    let system_prompt = input.system_prompt.as_deref().unwrap();
    assert!(system_prompt.contains("Respond only with a JSON object that matches this JSON schema:"));
    assert!(system_prompt.contains("\"answer\""));
}

#[tokio::test]
async fn schema_stays_out_of_the_prompt_when_the_provider_enforces_it() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(json_response(json!({ "answer": "Chlorophyll absorbs light." })));

    composer(&model)
        .answer(&StudyChatRequest::new("What absorbs light in a leaf?"))
        .await
        .unwrap();

    let system_prompt = model.tracked_generate_inputs()[0].system_prompt.clone().unwrap();
    assert!(!system_prompt.contains("JSON schema"));
}
