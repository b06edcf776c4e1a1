use serde::Deserialize;

/// Configuration for the API server
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Redis URL
    pub redis_url: String,
    /// HS256 secret used to sign access tokens
    pub jwt_secret: String,
    /// Lifetime of an access token in seconds
    #[serde(default = "default_jwt_expires_seconds")]
    pub jwt_expires_seconds: i64,
    /// Port to run the server on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Root directory for uploaded files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// Allowed CORS origins, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Emails that receive the admin role when they register
    #[serde(default)]
    pub admin_emails: Vec<String>,
    /// Directory for the rotating audit log
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Emit stdout logs as JSON
    #[serde(default)]
    pub json_logs: bool,
    /// Password reset tokens expire after this many hours
    #[serde(default = "default_reset_token_ttl_hours")]
    pub reset_token_ttl_hours: i64,
    /// TTL for cached document status lookups
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

fn default_jwt_expires_seconds() -> i64 {
    3600
}

fn default_port() -> u16 {
    5000
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_max_content_length() -> usize {
    16 * 1024 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_reset_token_ttl_hours() -> i64 {
    24
}

fn default_cache_ttl_seconds() -> u64 {
    300
}
