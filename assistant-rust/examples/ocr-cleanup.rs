use base64::{engine::general_purpose::STANDARD, Engine};
use dotenvy::dotenv;
use std::{env, error::Error, path::Path, sync::Arc};
use study_assistant::{AssistantConfig, CleanupAction, OcrSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let path = env::args().nth(1).ok_or("usage: ocr-cleanup <image>")?;
    let mime_type = match Path::new(&path).extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let data_uri = format!(
        "data:{mime_type};base64,{}",
        STANDARD.encode(std::fs::read(&path)?)
    );

    let config = AssistantConfig::from_env()?;
    let ocr = OcrSession::new(Arc::new(config.composer_params()?.build()));

    let text = ocr.extract(&data_uri).await?;
    println!("--- extracted ---\n{text}\n");

    let cleaned = ocr.apply(CleanupAction::Clean).await?;
    println!("--- cleaned ---\n{cleaned}\n");

    let shortened = ocr.apply(CleanupAction::Shorten).await?;
    println!("--- shortened ---\n{shortened}");

    Ok(())
}
