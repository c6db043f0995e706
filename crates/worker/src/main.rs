//! `dreamforge-worker` -- runs one prompt through the generation pipeline.
//!
//! Usage: `dreamforge-worker <PROMPT>...`. With no arguments the prompt is
//! read from `PROMPT`. Prints the response message on success and exits
//! with status 1 when the run fails. See
//! [`PipelineSettings::from_env`](dreamforge_core::settings::PipelineSettings::from_env)
//! for the remaining environment variables.

use clap::Parser;
use dreamforge_core::settings::PipelineSettings;
use dreamforge_worker::{execute, Cli};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreamforge_worker=debug,dreamforge_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = PipelineSettings::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid settings");
        std::process::exit(1);
    });

    tracing::info!(
        caller = %settings.caller_id,
        image_capability = %settings.image_capability_id,
        model_capability = %settings.model_capability_id,
        artifact_dir = %settings.artifact_dir.display(),
        "Starting dreamforge-worker",
    );

    match execute(&settings, cli.prompt()).await {
        Ok(result) => println!("{}", result.message()),
        Err(e) => {
            tracing::error!(error = %e, "Pipeline run failed");
            std::process::exit(1);
        }
    }
}
