mod assignments;
mod buildings;
mod common;
mod config;
mod counters;
mod external;
mod locations;
mod orders;
mod routes;

use crate::common::state::AppState;
use crate::config::Config;
use anyhow::Context;
use axum_keycloak_auth::{Url, instance::KeycloakAuthInstance, instance::KeycloakConfig};
use clap::{Parser, Subcommand, ValueEnum};
use migration::{InventoryMigrator, LocationMigrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "facility-api", about = "Facility management services", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one of the services
    Serve {
        #[arg(long, env = "SERVICE", value_enum)]
        service: Service,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Service {
    /// Locations, buildings and technician assignments
    Location,
    /// Work orders and their photos
    Inventory,
}

fn keycloak_instance(config: &Config) -> anyhow::Result<Option<Arc<KeycloakAuthInstance>>> {
    if config.keycloak_url.is_empty() {
        return Ok(None);
    }
    let server = Url::parse(&config.keycloak_url).context("KEYCLOAK_URL is not a valid URL")?;
    Ok(Some(Arc::new(KeycloakAuthInstance::new(
        KeycloakConfig::builder()
            .server(server)
            .realm(String::from(&config.keycloak_realm))
            .build(),
    ))))
}

async fn serve(service: Service) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db_url = config.db_url.clone().context("No database URL configured")?;

    let db: DatabaseConnection = Database::connect(&db_url)
        .await
        .context("Could not connect to the database")?;
    tracing::info!("Connected to the database");

    match service {
        Service::Location => LocationMigrator::up(&db, None).await,
        Service::Inventory => InventoryMigrator::up(&db, None).await,
    }
    .context("Failed to run migrations")?;
    tracing::info!("DB migrations complete");

    let blobs = crate::external::s3::blob_store_from_config(&config).await;
    let state = AppState::new(db, config.clone(), keycloak_instance(&config)?, blobs);
    let router = match service {
        Service::Location => routes::build_location_router(&state),
        Service::Inventory => routes::build_inventory_router(&state),
    };

    tracing::info!(
        "Starting {} {service:?} service ({} deployment)",
        config.app_name,
        config.deployment.to_uppercase()
    );
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Could not bind {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Serve { service } => serve(service).await,
    }
}
