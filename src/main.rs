use calnotion::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar reconciliation");

    // Load configuration
    let config = startup::load_config()?;

    // Run a single reconciliation; a fatal error maps to a non-zero exit so
    // the external scheduler can observe the failure.
    startup::run_sync(&config).await?;

    Ok(())
}
