use axum::extract::FromRef;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db::DbClient;
use crate::monitoring::install_recorder;
use crate::services::storage::Storage;
use metrics_exporter_prometheus::PrometheusHandle;

/// Account policy applied by the auth handlers
#[derive(Debug, Clone, Default)]
pub struct AccountSettings {
    pub admin_emails: Vec<String>,
    pub reset_token_ttl_hours: i64,
}

impl AccountSettings {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DbClient,
    pub jwt: JwtKeys,
    pub storage: Storage,
    pub accounts: AccountSettings,
    pub cors_origins: Vec<String>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn from_config(config: &Config, db: DbClient) -> Self {
        AppState {
            db,
            jwt: JwtKeys::new(config.jwt_secret.as_bytes(), config.jwt_expires_seconds),
            storage: Storage::new(&config.upload_dir, config.max_content_length),
            accounts: AccountSettings {
                admin_emails: config.admin_emails.clone(),
                reset_token_ttl_hours: config.reset_token_ttl_hours,
            },
            cors_origins: config.cors_origins.clone(),
            metrics: install_recorder(),
        }
    }
}

impl FromRef<AppState> for DbClient {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl FromRef<AppState> for Storage {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}

impl FromRef<AppState> for AccountSettings {
    fn from_ref(state: &AppState) -> Self {
        state.accounts.clone()
    }
}

impl FromRef<AppState> for PrometheusHandle {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::connection::tests::offline_client;

    pub(crate) const TEST_SECRET: &[u8] = b"router-test-secret";

    /// State whose backing services are never reached
    pub(crate) fn offline_state(upload_dir: &std::path::Path) -> AppState {
        AppState {
            db: offline_client(),
            jwt: JwtKeys::new(TEST_SECRET, 3600),
            storage: Storage::new(upload_dir, 1024 * 1024),
            accounts: AccountSettings {
                admin_emails: vec!["root@veritrust.ai".into()],
                reset_token_ttl_hours: 24,
            },
            cors_origins: vec!["*".into()],
            metrics: install_recorder(),
        }
    }

    #[test]
    fn test_from_config() {
        let config: Config = envy::from_iter(vec![
            ("DATABASE_URL".to_string(), "postgres://127.0.0.1:1/db".to_string()),
            ("REDIS_URL".to_string(), "redis://127.0.0.1:1".to_string()),
            ("JWT_SECRET".to_string(), "secret".to_string()),
            ("ADMIN_EMAILS".to_string(), "Root@Veritrust.ai".to_string()),
        ])
        .unwrap();

        let state = AppState::from_config(&config, offline_client());
        assert_eq!(state.jwt.expires_in(), 3600);
        assert_eq!(state.storage.max_bytes(), 16 * 1024 * 1024);
        assert!(state.accounts.is_admin_email("root@veritrust.ai"));
        assert!(!state.accounts.is_admin_email("guest@veritrust.ai"));
    }
}
