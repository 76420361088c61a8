use dotenvy::dotenv;
use std::{
    error::Error,
    io::{self, BufRead, Write},
    sync::Arc,
};
use study_assistant::{
    markdown_file_name, to_markdown, AssistantConfig, OutputFormat, ProcessingMode,
    RefinementController, StudyChatController,
};

const NOTES: &str = "The French Revolution (1789-1799) was a period of political and societal change in France. It began with the Estates General of 1789 and ended with the coup of 18 Brumaire in November 1799 and the formation of the French Consulate. Many of its ideas are considered fundamental principles of liberal democracy.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AssistantConfig::from_env()?;
    let composer = Arc::new(config.composer_params()?.build());

    let controller = RefinementController::new(composer.clone());
    let chat = StudyChatController::over_artifact(composer, controller.view());

    let artifact = controller
        .generate(NOTES, ProcessingMode::Simplify, OutputFormat::BulletPoints)
        .await?;
    if let Some(heading) = &artifact.heading {
        println!("# {heading}\n");
    }
    println!("{}\n", artifact.body);

    println!("Refine with an instruction, ask with '?question', or press enter to finish.");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        let line = line.trim();

        if let Some(question) = line.strip_prefix('?') {
            match chat.ask(question).await {
                Ok(answer) => println!("{answer}\n"),
                Err(error) => eprintln!("{error}"),
            }
            continue;
        }

        match controller.refine(line).await {
            Ok(artifact) => println!("[v{}]\n{}\n", artifact.version, artifact.body),
            Err(error) => eprintln!("{error}"),
        }
    }

    if let Some(artifact) = controller.artifact().await {
        let file_name = markdown_file_name(ProcessingMode::Simplify, OutputFormat::BulletPoints);
        println!("--- {file_name} ---\n{}", to_markdown(&artifact.body));
    }

    Ok(())
}
