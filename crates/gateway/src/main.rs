use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pl_domain::config::Config;
use pl_engine::OpenAiCompatEngine;
use pl_gateway::cli::{Cli, Command, ConfigCommand};
use pl_gateway::state::AppState;
use pl_gateway::{api, cli};
use pl_scheduler::Translator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, config_path) = cli::load_config()?;
            init_tracing();
            run_server(Arc::new(config), &config_path).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            if !cli::validate() {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = cli::load_config()?;
            cli::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("pagelingo {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_server(config: Arc<Config>, config_path: &str) -> anyhow::Result<()> {
    tracing::info!(config_path, "starting pagelingo gateway");

    let engine = OpenAiCompatEngine::connect(&config.engine)?;
    let translator = Translator::new(engine, &config);
    let state = AppState {
        config: config.clone(),
        translator,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, engine = %config.engine.base_url, "listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}
