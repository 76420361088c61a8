mod common;

use axum::http::StatusCode;
use common::stub_server::{BoxedError, StubServer};
use serde_json::json;
use study_sdk::{
    openai::{OpenAIChatModel, OpenAIChatModelOptions},
    LanguageModel, LanguageModelError, LanguageModelInput, Message, Part, ResponseFormatJson,
    ResponseFormatOption,
};

fn openai_model(stub: &StubServer) -> OpenAIChatModel {
    OpenAIChatModel::new(
        "gpt-4o-mini",
        OpenAIChatModelOptions {
            api_key: "sk-test".to_string(),
            base_url: Some(stub.url().to_string()),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn generate_sends_bearer_auth_and_strict_schema() -> Result<(), BoxedError> {
    let stub = StubServer::start(
        StatusCode::OK,
        json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"extracted_text\":\"Chapter 1\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 5}
        }),
    )
    .await?;

    let model = openai_model(&stub);
    let response = model
        .generate(LanguageModelInput {
            system_prompt: Some("Extract all text.".to_string()),
            messages: vec![Message::user([
                Part::text("Photo of a page"),
                Part::image("aGVsbG8=", "image/png"),
            ])],
            response_format: Some(ResponseFormatOption::Json(ResponseFormatJson {
                name: "extracted_text".to_string(),
                description: None,
                schema: Some(json!({"type": "object"})),
            })),
            ..Default::default()
        })
        .await?;

    assert_eq!(
        response.text().as_deref(),
        Some("{\"extracted_text\":\"Chapter 1\"}")
    );

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/chat/completions");
    assert_eq!(
        request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
        Some("Bearer sk-test")
    );
    assert_eq!(request.body["model"], "gpt-4o-mini");
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(
        request.body["messages"][1]["content"][1]["image_url"]["url"],
        "data:image/png;base64,aGVsbG8="
    );
    assert_eq!(request.body["response_format"]["type"], "json_schema");
    assert_eq!(request.body["response_format"]["json_schema"]["strict"], true);

    stub.stop().await;
    Ok(())
}

#[tokio::test]
async fn refusal_is_surfaced_as_error() -> Result<(), BoxedError> {
    let stub = StubServer::start(
        StatusCode::OK,
        json!({
            "id": "chatcmpl-2",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null, "refusal": "I can't help with that."},
                "finish_reason": "stop"
            }]
        }),
    )
    .await?;

    let model = openai_model(&stub);
    let err = model
        .generate(LanguageModelInput {
            messages: vec![Message::user([Part::text("hello")])],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LanguageModelError::Refusal(ref message) if message == "I can't help with that."));

    stub.stop().await;
    Ok(())
}

#[tokio::test]
async fn server_error_maps_to_status_code() -> Result<(), BoxedError> {
    let stub = StubServer::start(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"message": "overloaded"}}),
    )
    .await?;

    let model = openai_model(&stub);
    let err = model
        .generate(LanguageModelInput {
            messages: vec![Message::user([Part::text("hello")])],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, LanguageModelError::StatusCode(status, _) if status.as_u16() == 500));

    stub.stop().await;
    Ok(())
}
