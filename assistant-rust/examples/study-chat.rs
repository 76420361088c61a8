use dotenvy::dotenv;
use std::{error::Error, sync::Arc};
use study_assistant::{AssistantConfig, StudyChatController};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AssistantConfig::from_env()?;
    let composer = Arc::new(
        config
            .composer_params()?
            .restrict_study_topics(true)
            .build(),
    );
    let chat = StudyChatController::standalone(composer);

    for question in [
        "What is the difference between mitosis and meiosis?",
        "Which one produces gametes?",
        "What is 2+2?",
    ] {
        println!("User: {question}");
        let answer = chat.ask(question).await?;
        println!("AI: {answer}\n");
    }

    Ok(())
}
