use tokio_cron_scheduler::{Job, JobScheduler};

use std::time::Duration;
use tracing::{debug, error};

use crate::error::StoreResult;
use crate::game::GameStorage;

pub struct Scheduler {
    scheduler: JobScheduler,
    storage: GameStorage,
}

pub enum JobProcess<'schedule> {
    InitializeStorage,
    RefreshCache(&'schedule str),
}

impl Scheduler {
    pub async fn new(storage: GameStorage) -> StoreResult<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Scheduler { scheduler, storage })
    }

    pub async fn add_job(&self, job_process: JobProcess<'_>) -> StoreResult<uuid::Uuid> {
        let job = match job_process {
            JobProcess::InitializeStorage => initialize_storage_job(self.storage.clone())?,
            JobProcess::RefreshCache(schedule) => {
                refresh_cache_job(schedule, self.storage.clone())?
            }
        };
        Ok(self.scheduler.add(job).await?)
    }

    pub async fn start(&self) -> StoreResult<()> {
        Ok(self.scheduler.start().await?)
    }

    pub async fn shutdown(&mut self) -> StoreResult<()> {
        Ok(self.scheduler.shutdown().await?)
    }
}

//////////////////
// Jobs definition
//////////////////

fn initialize_storage_job(storage: GameStorage) -> StoreResult<Job> {
    let job = Job::new_one_shot_async(Duration::from_secs(0), move |_uuid, _l| {
        let storage = storage.clone();
        Box::pin(async move {
            storage.init_storage().await;
        })
    })?;
    Ok(job)
}

fn refresh_cache_job(schedule: &str, storage: GameStorage) -> StoreResult<Job> {
    let job = Job::new_async(schedule, move |uuid, mut l| {
        let storage = storage.clone();
        Box::pin(async move {
            // Serves from cache while fresh, so this only hits the remote store when stale.
            let document = storage.load_data().await;
            debug!(
                free = document.leaderboard.free.len(),
                paid = document.leaderboard.paid.len(),
                "Background refresh done"
            );

            // Query the next execution time for this job
            let next_tick = l.next_tick_for_job(uuid).await;
            match next_tick {
                Ok(Some(ts)) => debug!("Next cache refresh at {:?}", ts),
                _ => error!("Could not get next tick for cache refresh job"),
            }
        })
    })?;
    Ok(job)
}
