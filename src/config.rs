use crate::credentials::CredentialSource;
use crate::error::{config_error, env_error, SyncResult};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Default lookback applied to the database query, in days
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Default forward horizon for both queries, in days
pub const DEFAULT_HORIZON_DAYS: i64 = 90;

/// Default per-request timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the sync job
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the Google service-account credential blob lives
    pub credentials: CredentialSource,
    /// Calendar identifiers to sweep, in configured order
    pub calendar_ids: Vec<String>,
    /// Notion integration token
    pub notion_token: String,
    /// Notion database holding the mirrored records
    pub notion_database_id: String,
    /// How far back the database query reaches past `now`
    pub lookback_days: i64,
    /// How far forward both queries reach past `now`
    pub horizon_days: i64,
    /// Per-request timeout applied to every outbound call
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let notion_token = env::var("NOTION_TOKEN").map_err(|_| env_error("NOTION_TOKEN"))?;
        let notion_database_id =
            env::var("NOTION_DATABASE_ID").map_err(|_| env_error("NOTION_DATABASE_ID"))?;

        // Comma-separated list of calendar identifiers
        let calendar_ids: Vec<String> = env::var("CALENDAR_IDS")
            .map_err(|_| env_error("CALENDAR_IDS"))?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if calendar_ids.is_empty() {
            return Err(config_error("CALENDAR_IDS contains no calendar identifiers"));
        }

        // Credential blob location: remote URL preferred, local file as fallback
        let credentials = match env::var("GOOGLE_CREDENTIALS_URL") {
            Ok(url) => CredentialSource::Url(url),
            Err(_) => match env::var("GOOGLE_CREDENTIALS_FILE") {
                Ok(path) => CredentialSource::File(PathBuf::from(path)),
                Err(_) => {
                    return Err(env_error("GOOGLE_CREDENTIALS_URL or GOOGLE_CREDENTIALS_FILE"))
                }
            },
        };

        // Parse numeric values
        let lookback_days = match env::var("LOOKBACK_DAYS") {
            Ok(v) => v
                .parse::<i64>()
                .map_err(|_| env_error("Invalid LOOKBACK_DAYS format"))?,
            Err(_) => DEFAULT_LOOKBACK_DAYS,
        };

        let horizon_days = match env::var("HORIZON_DAYS") {
            Ok(v) => v
                .parse::<i64>()
                .map_err(|_| env_error("Invalid HORIZON_DAYS format"))?,
            Err(_) => DEFAULT_HORIZON_DAYS,
        };

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| env_error("Invalid REQUEST_TIMEOUT_SECS format"))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Config {
            credentials,
            calendar_ids,
            notion_token,
            notion_database_id,
            lookback_days,
            horizon_days,
            request_timeout_secs,
        })
    }
}
