//! Volunteer platform HTTP server.

use volunteer_server::config::Config;
use volunteer_server::{run, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting volunteer platform server");
    let config = Config::from_env()?;
    run(config).await
}
