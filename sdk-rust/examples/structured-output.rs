use dotenvy::dotenv;
use serde_json::{json, Value};
use study_sdk::{
    LanguageModelInput, LanguageModelRegistry, LanguageModelRegistryOptions, Message, Part,
    Provider, ResponseFormatJson, ResponseFormatOption,
};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let provider: Provider = std::env::var("STUDY_PROVIDER")
        .unwrap_or_else(|_| "google".to_string())
        .parse()
        .expect("Unsupported provider");

    let registry = LanguageModelRegistry::new(LanguageModelRegistryOptions {
        google_api_key: std::env::var("GOOGLE_API_KEY").ok(),
        openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
        ..Default::default()
    });
    let model = registry
        .get_model(provider, None)
        .expect("model should be configured");

    let text = r"Photosynthesis is the process by which green plants and some other organisms
use sunlight to synthesize foods from carbon dioxide and water. Photosynthesis in plants
generally involves the green pigment chlorophyll and generates oxygen as a byproduct.";

    let schema = json!({
      "type": "object",
      "properties": {
        "heading": {
          "type": "string",
          "description": "A short title for the text."
        },
        "key_terms": {
          "type": "array",
          "description": "Important terms a student should remember.",
          "items": { "type": "string" }
        }
      },
      "required": ["heading", "key_terms"],
      "additionalProperties": false
    });

    let response = model
        .generate(LanguageModelInput {
            system_prompt: Some(
                "You extract study aids from text according to the provided JSON schema.".into(),
            ),
            messages: vec![Message::user([Part::text(text)])],
            response_format: Some(ResponseFormatOption::Json(ResponseFormatJson {
                name: "study_aid".to_string(),
                description: Some("A heading and the key terms of a passage.".to_string()),
                schema: Some(schema),
            })),
            ..Default::default()
        })
        .await
        .unwrap();

    let text = response.text().expect("model returned no text");
    let val: Value = serde_json::from_str(&text).expect("Invalid JSON response");

    println!(
        "{}",
        serde_json::to_string_pretty(&val).expect("Failed to format JSON")
    );
}
