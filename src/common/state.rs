use crate::config::Config;
use crate::external::auth_service::AuthServiceClient;
use crate::external::inventory_service::InventoryServiceClient;
use crate::external::s3::BlobStore;
use axum_keycloak_auth::instance::KeycloakAuthInstance;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub keycloak_auth_instance: Option<Arc<KeycloakAuthInstance>>,
    pub auth_service: AuthServiceClient,
    pub inventory_service: InventoryServiceClient,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: Config,
        keycloak_auth_instance: Option<Arc<KeycloakAuthInstance>>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        // One pooled client shared by every outbound call
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.service_timeout_secs))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("Falling back to default HTTP client: {err}");
                reqwest::Client::new()
            });

        Self {
            auth_service: AuthServiceClient::new(http.clone(), &config.auth_service_url),
            inventory_service: InventoryServiceClient::new(http, &config.inventory_service_url),
            db,
            config,
            keycloak_auth_instance,
            blobs,
        }
    }
}
