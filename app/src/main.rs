use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use course_rag_core::{ResponseOrchestrator, Settings};

/// Ask the course assistant a single question.
#[derive(Parser)]
#[command(name = "course-rag", version)]
struct Args {
    /// The question to answer.
    query: String,
    /// Flattened transcript of earlier turns.
    #[arg(long)]
    history: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::load().context("failed to load settings")?;
    log::info!("using model {}", settings.model());
    let orchestrator = ResponseOrchestrator::new(Arc::new(settings))
        .context("failed to initialise response orchestrator")?;

    let answer = orchestrator
        .generate(&args.query, args.history.as_deref(), None, None)
        .await;
    println!("{answer}");
    Ok(())
}
