use crate::config::Config;
use crate::credentials;
use crate::error::Error;
use crate::google::{auth, CalendarClient};
use crate::notion::NotionClient;
use crate::reconcile::{Reconciler, SyncStats};
use crate::window::{reference_now, TimeWindow};
use chrono::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the job configuration from the environment
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Run one reconciliation: fetch credentials, compute the window, build the
/// clients, and sweep every configured calendar. Any fatal error propagates
/// so the scheduler observes a failed invocation.
pub async fn run_sync(config: &Config) -> miette::Result<SyncStats> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(Error::from)?;

    // Credentials must be resolvable before anything else runs
    let blob = credentials::fetch_blob(&http, &config.credentials).await?;
    let key = auth::parse_service_account_key(&blob)?;
    let access_token = auth::access_token(&http, &key).await?;

    let window = TimeWindow::compute(
        reference_now(),
        Duration::days(config.lookback_days),
        Duration::days(config.horizon_days),
    );
    info!(
        "Reconciling {} calendars over [{}, {})",
        config.calendar_ids.len(),
        window.query_from,
        window.query_to
    );

    let calendar = CalendarClient::new(http.clone(), access_token);
    let store = NotionClient::new(
        http,
        config.notion_token.clone(),
        config.notion_database_id.clone(),
    );

    let reconciler = Reconciler::new(&calendar, &store, &config.calendar_ids, window);
    let stats = reconciler.run().await?;

    if stats.is_noop() {
        info!("Already converged, nothing to apply");
    }
    Ok(stats)
}
