mod app;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "stockwatch")]
#[command(about = "Polls Apple Store pickup availability and alerts when stock appears")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the monitor until interrupted (default)
    Run,
    /// Fetch availability once and print every store
    Check {
        /// Print the store records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send a test message through the configured notification channel
    NotifyTest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = stockwatch_core::load_app_config()?;
    init_tracing(&config.log_level);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            tokio::select! {
                result = app::run_monitor(&config) => result?,
                () = shutdown_signal() => {}
            }
        }
        Commands::Check { json } => app::run_check(&config, json).await?,
        Commands::NotifyTest => app::run_notify_test(&config).await?,
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("[%H:%M:%S]".to_owned()))
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping monitor");
}
