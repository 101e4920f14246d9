//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes tracing, then dispatches to the
//! appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;

use cli::{Cli, Commands};
use parley_infra::config::{load_global_config, resolve_data_dir};
use parley_infra::llm::openai_compat::{OpenAiCompatConfig, OpenAiCompatibleGateway};
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::user::SqliteUserRepository;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let enable_otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    parley_observe::tracing_setup::init_tracing(enable_otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    match cli.command {
        Commands::Serve { host, port, .. } => {
            let state = AppState::init().await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parley API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::CreateUser { email } => {
            let data_dir = resolve_data_dir();
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_url =
                format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
            let db_pool = DatabasePool::new(&db_url).await?;
            let repo = SqliteUserRepository::new(db_pool);

            cli::user::create_user(&repo, &email).await?;
        }

        Commands::Prompts { input, output } => {
            let data_dir = resolve_data_dir();
            let config = load_global_config(&data_dir).await;

            let api_key: SecretString = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?
                .into();
            let mut gateway_config = OpenAiCompatConfig::openai(api_key);
            if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
                gateway_config.base_url = base_url;
            }
            let gateway = OpenAiCompatibleGateway::new(gateway_config);

            cli::prompts::run(&gateway, &config, &input, &output).await?;
        }
    }

    parley_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
