use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use listing_monitor::config::AppConfig;
use listing_monitor::service::MonitorService;
use listing_monitor::version::VERSION;
use listing_monitor::web;

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about = "Watches store listings and alerts when one disappears")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler and the HTTP control API (default)
    Serve,
    /// Watch a single listing
    Add { identity: String, locator: String },
    /// Import `identity|locator` lines from a file
    Import { file: String },
    /// Stop watching one or more listings
    Remove {
        #[arg(required = true)]
        identities: Vec<String>,
    },
    /// Print watched listings and their status
    List,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "listing-monitor.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_logging(&config.log_dir);
    info!(version = VERSION, "Starting listing-monitor.");

    let service = match MonitorService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Failed to initialise monitor.");
            return Err(e.into());
        }
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(service, &config).await?,
        Command::Add { identity, locator } => {
            service.add_target(&identity, &locator)?;
            println!("Added {identity}");
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let result = service.add_targets_batch(&text)?;
            println!(
                "Added {} target(s), rejected {} line(s)",
                result.added_count, result.rejected_count
            );
        }
        Command::Remove { identities } => {
            let removed = service.remove_targets(&identities)?;
            println!("Removed {removed} target(s)");
        }
        Command::List => {
            for target in service.list_targets() {
                let checked = target
                    .last_checked_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}\t{}\t{}\t{}",
                    target.identity, target.current_status, checked, target.locator
                );
            }
        }
    }

    Ok(())
}

async fn serve(
    service: Arc<MonitorService>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    service.start();

    let app = web::create_router(service.clone());
    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    info!(address = %config.listen_address, "HTTP control API listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal.");
            }
            info!("Shutdown signal received.");
        })
        .await?;

    service.stop().await;
    info!("listing-monitor stopped.");
    Ok(())
}
