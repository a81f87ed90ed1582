use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use text_categorizer::classifier::LlmClassifier;
use text_categorizer::config::AppConfig;
use text_categorizer::llm::create_provider;
use text_categorizer::pipeline::{ReplyWorkflow, TextState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    eprintln!("text-categorizer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {:?}", config.llm.backend);
    eprintln!("   Model: {}", config.llm.model);

    let llm = create_provider(&config.llm).context("creating LLM provider")?;
    let classifier = Arc::new(LlmClassifier::new(llm));
    let workflow =
        ReplyWorkflow::new(classifier, &config.workflow).context("building reply pipeline")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let state = workflow.run(args.join(" ")).await?;
        print_state(&state)?;
        return Ok(());
    }

    eprintln!("   Type a message and press Enter. Ctrl-D to exit.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        match workflow.run(line).await {
            Ok(state) => print_state(&state)?,
            Err(e) => tracing::error!(error = %e, "Run failed"),
        }
        eprint!("> ");
    }

    Ok(())
}

fn print_state(state: &TextState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(state)?);
    Ok(())
}
