use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

const DEFAULT_ADMIN_ROLE: &str = "facility-admin";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: Option<String>,
    pub app_name: String,
    pub port: u16,
    pub keycloak_ui_id: String,
    pub keycloak_url: String,
    pub keycloak_realm: String,
    pub deployment: String,
    pub auth_service_url: String,
    pub inventory_service_url: String,
    pub service_timeout_secs: u64,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub s3_bucket_id: String,
    pub s3_url: String,
    pub tests_running: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load from .env file if available
        let db_url = match env::var("DB_URL") {
            Ok(url) => Some(url),
            Err(_) => Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").context("DB_USER must be set")?,
                env::var("DB_PASSWORD").context("DB_PASSWORD must be set")?,
                env::var("DB_HOST").context("DB_HOST must be set")?,
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").context("DB_NAME must be set")?,
            )),
        };

        Ok(Config {
            app_name: env::var("APP_NAME").context("APP_NAME must be set")?,
            port: env::var("PORT")
                .ok()
                .map(|port| port.parse().context("PORT must be a valid port number"))
                .transpose()?
                .unwrap_or(3000),
            keycloak_ui_id: env::var("KEYCLOAK_UI_ID").unwrap_or_default(),
            // An empty Keycloak URL disables token validation
            keycloak_url: env::var("KEYCLOAK_URL").unwrap_or_default(),
            keycloak_realm: env::var("KEYCLOAK_REALM").unwrap_or_default(),
            deployment: env::var("DEPLOYMENT")
                .context("DEPLOYMENT must be set, this can be local, dev, stage, or prod")?,
            auth_service_url: env::var("AUTH_SERVICE_URL")
                .context("AUTH_SERVICE_URL must be set")?,
            inventory_service_url: env::var("INVENTORY_SERVICE_URL")
                .context("INVENTORY_SERVICE_URL must be set")?,
            service_timeout_secs: env::var("SERVICE_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| secs.parse().ok())
                .unwrap_or(10),
            s3_access_key: env::var("S3_ACCESS_KEY").unwrap_or_default(),
            s3_secret_key: env::var("S3_SECRET_KEY").unwrap_or_default(),
            s3_bucket_id: env::var("S3_BUCKET_ID").unwrap_or_default(),
            s3_url: env::var("S3_URL").unwrap_or_default(),
            tests_running: false,
            db_url,
        })
    }

    /// S3 is only used when every S3 setting is present.
    pub fn s3_configured(&self) -> bool {
        !(self.s3_url.is_empty()
            || self.s3_bucket_id.is_empty()
            || self.s3_access_key.is_empty()
            || self.s3_secret_key.is_empty())
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "facility-api-test".to_string(),
            port: 3000,
            keycloak_ui_id: "test-ui".to_string(),
            keycloak_url: String::new(),
            keycloak_realm: "test-realm".to_string(),
            deployment: "test".to_string(),
            auth_service_url: "http://127.0.0.1:9".to_string(),
            inventory_service_url: "http://127.0.0.1:9".to_string(),
            service_timeout_secs: 2,
            s3_access_key: String::new(),
            s3_secret_key: String::new(),
            s3_bucket_id: String::new(),
            s3_url: String::new(),
            tests_running: true,
            db_url: None,
        }
    }
}

/// Keycloak realm role that grants administrator rights.
pub fn admin_role_name() -> String {
    env::var("ADMIN_ROLE").unwrap_or_else(|_| DEFAULT_ADMIN_ROLE.to_string())
}
