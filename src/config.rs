use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL advertised in the manifest webhook targets.
    pub app_base_url: String,
    /// Shared secret for webhook signature verification. Unset disables
    /// verification (local development only).
    pub webhook_secret: Option<String>,
    pub webhook_max_skew_secs: i64,
    pub platform_api_url: Option<String>,
    pub platform_token: Option<String>,
    pub platform_timeout_secs: u64,
    pub processor: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let app_base_url = env::var("APP_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        let webhook_max_skew_secs = env::var("WEBHOOK_MAX_SKEW_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(300);
        let platform_api_url = env::var("PLATFORM_API_URL").ok();
        let platform_token = env::var("PLATFORM_TOKEN").ok();
        let platform_timeout_secs = env::var("PLATFORM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10);
        let processor = env::var("PROCESSOR").unwrap_or_else(|_| "dummy".to_string());

        Ok(Self {
            host,
            port,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
            webhook_secret,
            webhook_max_skew_secs: webhook_max_skew_secs.max(1),
            platform_api_url,
            platform_token,
            platform_timeout_secs: platform_timeout_secs.max(1),
            processor,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            app_base_url: "http://localhost:8080".to_string(),
            webhook_secret: None,
            webhook_max_skew_secs: 300,
            platform_api_url: None,
            platform_token: None,
            platform_timeout_secs: 10,
            processor: "dummy".to_string(),
        }
    }
}
