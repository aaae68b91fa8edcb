use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value {other:?}"),
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub cors_allowed_origin: Option<String>,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub chat_delay_min: Duration,
    pub chat_delay_max: Duration,
    pub seed_fixtures: bool,
    pub bootstrap_admin_email: String,
    pub bootstrap_admin_password_hash: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or_else(|| "ragdesk".to_string());
        let jwt_audience =
            lookup("JWT_AUDIENCE").unwrap_or_else(|| "ragdesk-console".to_string());
        let jwt_expiry_minutes = lookup("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("JWT_EXPIRY_MINUTES must be an integer")?;
        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN");
        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));
        let upload_max_bytes = match lookup("UPLOAD_MAX_BYTES") {
            Some(value) => value
                .parse()
                .context("UPLOAD_MAX_BYTES must be a positive integer")?,
            None => DEFAULT_UPLOAD_MAX_BYTES,
        };
        let chat_delay_min_ms: u64 = lookup("CHAT_DELAY_MIN_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .context("CHAT_DELAY_MIN_MS must be an integer")?;
        let chat_delay_max_ms: u64 = lookup("CHAT_DELAY_MAX_MS")
            .unwrap_or_else(|| "2000".to_string())
            .parse()
            .context("CHAT_DELAY_MAX_MS must be an integer")?;
        let seed_fixtures = match lookup("SEED_FIXTURES") {
            Some(value) => parse_flag(&value).context("SEED_FIXTURES must be a boolean")?,
            None => true,
        };
        let bootstrap_admin_email = lookup("BOOTSTRAP_ADMIN_EMAIL")
            .unwrap_or_else(|| "admin@company.com".to_string());
        let bootstrap_admin_password_hash = lookup("BOOTSTRAP_ADMIN_PASSWORD_HASH");

        ensure!(upload_max_bytes > 0, "UPLOAD_MAX_BYTES must be a positive integer");
        ensure!(
            chat_delay_min_ms <= chat_delay_max_ms,
            "CHAT_DELAY_MIN_MS must not exceed CHAT_DELAY_MAX_MS"
        );

        Ok(Self {
            server_host,
            server_port,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            jwt_expiry_minutes,
            cors_allowed_origin,
            upload_dir,
            upload_max_bytes,
            chat_delay_min: Duration::from_millis(chat_delay_min_ms),
            chat_delay_max: Duration::from_millis(chat_delay_max_ms),
            seed_fixtures,
            bootstrap_admin_email,
            bootstrap_admin_password_hash,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
