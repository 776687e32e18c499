use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Identity
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub google_client_id: Option<String>,

    // Notifications
    pub admin_webhook_url: Option<String>,

    // Job cadence
    pub reconcile_interval_secs: u64,
    pub rank_refresh_interval_secs: u64,
}

impl Config {
    /// Load configuration for the API server.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            jwt_secret: required_env("JWT_SECRET"),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "ujamaa".to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID").ok(),
            admin_webhook_url: env::var("ADMIN_WEBHOOK_URL").ok(),
            reconcile_interval_secs: env_u64("RECONCILE_INTERVAL_SECS", 300),
            rank_refresh_interval_secs: env_u64("RANK_REFRESH_INTERVAL_SECS", 86_400),
        }
    }

    /// Load a minimal config for the one-shot job runner (no web server,
    /// no identity layer).
    pub fn jobs_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            api_host: String::new(),
            api_port: 0,
            jwt_secret: String::new(),
            jwt_issuer: String::new(),
            google_client_id: None,
            admin_webhook_url: env::var("ADMIN_WEBHOOK_URL").ok(),
            reconcile_interval_secs: env_u64("RECONCILE_INTERVAL_SECS", 300),
            rank_refresh_interval_secs: env_u64("RANK_REFRESH_INTERVAL_SECS", 86_400),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
