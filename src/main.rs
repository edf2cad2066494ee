use pull_board::client::edge_config::EdgeConfig;
use pull_board::config::Settings;
use pull_board::game::GameStorage;
use pull_board::scheduler::{JobProcess, Scheduler};
use pull_board::utils::SystemClock;

use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::new()?;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(settings.get_trace_level())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let remote = EdgeConfig::from_settings(&settings)?;
    let storage = GameStorage::new(
        Arc::new(remote),
        Arc::new(SystemClock),
        settings.cache_options(),
        settings.address_policy(),
    );

    let mut sched = Scheduler::new(storage.clone()).await?;

    let jobs = vec![
        JobProcess::InitializeStorage, // only ran once, at startup.
        JobProcess::RefreshCache(&settings.refresh_schedule),
    ];
    for job in jobs {
        sched.add_job(job).await?;
    }

    info!("Starting scheduler.");
    sched.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down, saving pending changes.");
    sched.shutdown().await?;
    if let Err(e) = storage.flush().await {
        error!("{e}");
    }

    Ok(())
}
