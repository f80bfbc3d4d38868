//! Course Service Library
//!
//! Course catalogue and publishing lifecycle over gRPC.
//! It can be run as a standalone service or embedded in the combined binary.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::info;

use crate::config::CourseServiceConfig;
use crate::grpc::CourseGrpcService;
use crate::infra::Database;
use crate::repository::CourseStore;
use crate::service::CourseManager;

/// Run the course service as an embedded component (for combined binary).
pub async fn run_embedded(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = CourseServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = CourseServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                println!("{} {}", if applied { "[x]" } else { "[ ]" }, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run the gRPC server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: CourseServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;

    let repository = Arc::new(CourseStore::new(db.get_connection()));
    let service = Arc::new(CourseManager::new(repository));
    let grpc_service = CourseGrpcService::new(service);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Course service listening on {}", addr);

    Server::builder()
        .add_service(proto::CourseServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
