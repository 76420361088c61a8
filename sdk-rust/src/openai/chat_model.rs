use super::chat_api::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContentPart, CompletionUsage, CreateChatCompletionRequest,
    CreateChatCompletionResponse, ImageUrl, JsonSchemaConfig, ResponseFormat,
};
use crate::{
    client_utils, data_uri, AssistantMessage, LanguageModel, LanguageModelError,
    LanguageModelInput, LanguageModelMetadata, LanguageModelResult, Message, ModelResponse,
    ModelUsage, Part, ResponseFormatJson, ResponseFormatOption, UserMessage,
};
use futures::future::BoxFuture;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::{collections::HashMap, sync::Arc};

const PROVIDER: &str = "openai";

pub struct OpenAIChatModel {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
    metadata: Option<Arc<LanguageModelMetadata>>,
    headers: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct OpenAIChatModelOptions {
    pub base_url: Option<String>,
    pub api_key: String,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl OpenAIChatModel {
    #[must_use]
    pub fn new(model_id: impl Into<String>, options: OpenAIChatModelOptions) -> Self {
        let OpenAIChatModelOptions {
            base_url,
            api_key,
            headers,
            client,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string();
        let client = client.unwrap_or_else(Client::new);
        let headers = headers.unwrap_or_default();

        Self {
            model_id: model_id.into(),
            api_key,
            base_url,
            client,
            metadata: Some(Arc::new(LanguageModelMetadata {
                structured_output: true,
                image_input: true,
            })),
            headers,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: LanguageModelMetadata) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    fn request_headers(&self) -> LanguageModelResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let auth_header =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI API key header value: {error}"
                ))
            })?;
        headers.insert(header::AUTHORIZATION, auth_header);

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI header name '{key}': {error}"
                ))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid OpenAI header value for '{key}': {error}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

impl LanguageModel for OpenAIChatModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    fn metadata(&self) -> Option<&LanguageModelMetadata> {
        self.metadata.as_deref()
    }

    fn generate(
        &self,
        input: LanguageModelInput,
    ) -> BoxFuture<'_, LanguageModelResult<ModelResponse>> {
        Box::pin(async move {
            crate::opentelemetry::trace_generate(
                self.provider(),
                &self.model_id(),
                input,
                |input| async move {
                    let request = convert_to_openai_create_params(input, &self.model_id);
                    let headers = self.request_headers()?;

                    let response: CreateChatCompletionResponse = client_utils::send_json(
                        &self.client,
                        &format!("{}/chat/completions", self.base_url),
                        &request,
                        headers,
                    )
                    .await?;

                    let choice = response.choices.into_iter().next().ok_or_else(|| {
                        LanguageModelError::Invariant(
                            PROVIDER,
                            "No choices in response".to_string(),
                        )
                    })?;

                    let message = choice.message;

                    if let Some(refusal) = &message.refusal {
                        if !refusal.is_empty() {
                            return Err(LanguageModelError::Refusal(refusal.clone()));
                        }
                    }

                    let content = message
                        .content
                        .filter(|text| !text.is_empty())
                        .map(|text| vec![Part::text(text)])
                        .unwrap_or_default();

                    Ok(ModelResponse {
                        content,
                        usage: response.usage.as_ref().map(map_openai_usage),
                    })
                },
            )
            .await
        })
    }
}

fn convert_to_openai_create_params(
    input: LanguageModelInput,
    model_id: &str,
) -> CreateChatCompletionRequest {
    CreateChatCompletionRequest {
        model: model_id.to_string(),
        messages: convert_to_openai_messages(input.messages, input.system_prompt),
        temperature: input.temperature,
        top_p: input.top_p,
        max_completion_tokens: input.max_tokens,
        seed: input.seed,
        response_format: input.response_format.map(convert_to_openai_response_format),
        metadata: input.metadata,
    }
}

fn convert_to_openai_messages(
    messages: Vec<Message>,
    system_prompt: Option<String>,
) -> Vec<ChatCompletionRequestMessage> {
    let mut openai_messages = Vec::new();

    if let Some(prompt) = system_prompt {
        openai_messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessage { content: prompt },
        ));
    }

    for message in messages {
        match message {
            Message::User(user_message) => {
                openai_messages.push(ChatCompletionRequestMessage::User(convert_user_message(
                    user_message,
                )));
            }
            Message::Assistant(assistant_message) => {
                openai_messages.push(ChatCompletionRequestMessage::Assistant(
                    convert_assistant_message(assistant_message),
                ));
            }
        }
    }

    openai_messages
}

fn convert_user_message(user_message: UserMessage) -> ChatCompletionRequestUserMessage {
    let content = user_message
        .content
        .into_iter()
        .map(|part| match part {
            Part::Text(text_part) => {
                ChatCompletionRequestUserMessageContentPart::Text {
                    text: text_part.text,
                }
            }
            Part::Image(image_part) => ChatCompletionRequestUserMessageContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: data_uri::to_data_uri(&image_part),
                },
            },
        })
        .collect();

    ChatCompletionRequestUserMessage { content }
}

/// Assistant history only carries text; images the model produced are not
/// replayed.
fn convert_assistant_message(
    assistant_message: AssistantMessage,
) -> ChatCompletionRequestAssistantMessage {
    let content = assistant_message
        .content
        .iter()
        .filter_map(Part::as_text)
        .collect::<Vec<_>>()
        .concat();

    ChatCompletionRequestAssistantMessage { content }
}

fn convert_to_openai_response_format(response_format: ResponseFormatOption) -> ResponseFormat {
    match response_format {
        ResponseFormatOption::Text => ResponseFormat::Text,
        ResponseFormatOption::Json(ResponseFormatJson {
            name,
            description,
            schema,
        }) => {
            if let Some(schema) = schema {
                ResponseFormat::JsonSchema {
                    json_schema: JsonSchemaConfig {
                        description,
                        name,
                        schema: Some(schema),
                        strict: Some(true),
                    },
                }
            } else {
                ResponseFormat::JsonObject
            }
        }
    }
}

fn map_openai_usage(usage: &CompletionUsage) -> ModelUsage {
    ModelUsage {
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn system_prompt_comes_first_and_images_become_data_urls() {
        let request = convert_to_openai_create_params(
            LanguageModelInput {
                system_prompt: Some("You are helpful".to_string()),
                messages: vec![
                    Message::user([Part::text("Read this"), Part::image("aGk=", "image/jpeg")]),
                    Message::assistant([Part::text("Done")]),
                ],
                ..Default::default()
            },
            "gpt-4o-mini",
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "You are helpful"},
                    {"role": "user", "content": [
                        {"type": "text", "text": "Read this"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,aGk="}}
                    ]},
                    {"role": "assistant", "content": "Done"}
                ]
            })
        );
    }

    #[test]
    fn json_schema_format_is_strict() {
        let format = convert_to_openai_response_format(ResponseFormatOption::Json(
            ResponseFormatJson {
                name: "processed_text".to_string(),
                description: None,
                schema: Some(json!({"type": "object"})),
            },
        ));
        assert_eq!(
            serde_json::to_value(format).unwrap(),
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "processed_text",
                    "schema": {"type": "object"},
                    "strict": true
                }
            })
        );
    }
}
