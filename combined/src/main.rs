//! Combined binary for development - runs every service in one process.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coach-books")]
#[command(about = "Bookkeeping and course services in a single binary")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway and both gRPC services in a single process
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value = "3000")]
        gateway_port: u16,
        #[arg(long, default_value = "50061")]
        ledger_port: u16,
        #[arg(long, default_value = "50062")]
        course_port: u16,
    },
    /// Run database migrations for both services
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Rebuild system-generated journal entries from their source documents
    Rejournalize {
        /// Report what would change and roll back
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

impl From<MigrateAction> for ledger_service_lib::MigrateAction {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => Self::Up,
            MigrateAction::Down => Self::Down,
            MigrateAction::Status => Self::Status,
            MigrateAction::Fresh => Self::Fresh,
        }
    }
}

impl From<MigrateAction> for course_service_lib::MigrateAction {
    fn from(action: MigrateAction) -> Self {
        match action {
            MigrateAction::Up => Self::Up,
            MigrateAction::Down => Self::Down,
            MigrateAction::Status => Self::Status,
            MigrateAction::Fresh => Self::Fresh,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            gateway_port,
            ledger_port,
            course_port,
        } => {
            info!("Starting combined services in development mode");
            info!("  Gateway:        http://{}:{}", host, gateway_port);
            info!("  Ledger service: http://{}:{}", host, ledger_port);
            info!("  Course service: http://{}:{}", host, course_port);

            let ledger_host = host.clone();
            let ledger_handle = tokio::spawn(async move {
                if let Err(e) = ledger_service_lib::run_embedded(&ledger_host, ledger_port).await {
                    error!("Ledger service failed: {}", e);
                }
            });

            let course_host = host.clone();
            let course_handle = tokio::spawn(async move {
                if let Err(e) = course_service_lib::run_embedded(&course_host, course_port).await {
                    error!("Course service failed: {}", e);
                }
            });

            // Wait a moment for both services to bind before the gateway dials them
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;

            let gateway_host = host.clone();
            let gateway_handle = tokio::spawn(async move {
                if let Err(e) =
                    gateway_lib::run_embedded(&gateway_host, gateway_port, ledger_port, course_port)
                        .await
                {
                    error!("Gateway failed: {}", e);
                }
            });

            // Wait for any service to exit (which would indicate an error)
            tokio::select! {
                _ = ledger_handle => {
                    error!("Ledger service exited unexpectedly");
                }
                _ = course_handle => {
                    error!("Course service exited unexpectedly");
                }
                _ = gateway_handle => {
                    error!("Gateway exited unexpectedly");
                }
            }
            return Err("a service exited unexpectedly".into());
        }
        Commands::Migrate { action } => {
            // Each service owns its own database
            ledger_service_lib::run_migrations(action.into()).await?;
            course_service_lib::run_migrations(action.into()).await?;
        }
        Commands::Rejournalize { dry_run } => {
            ledger_service_lib::rejournalize(dry_run).await?;
        }
    }

    Ok(())
}
