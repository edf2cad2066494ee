use std::error::Error;
use std::fmt;
use std::time::Duration;
use tokio_cron_scheduler::JobSchedulerError;

/// Custom Error and Result types to unify errors from all sources.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Http(String),
    Remote(String),
    Timeout(Duration),
    Parse(String),
    Config(String),
    Scheduler(String),
    Persist(u64),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Http(s) => write!(f, "HTTP Error: {}", s),
            StoreError::Remote(s) => write!(f, "Remote Store Error: {}", s),
            StoreError::Timeout(d) => write!(f, "Timeout Error: no answer after {:?}", d),
            StoreError::Parse(s) => write!(f, "Parse Error: {}", s),
            StoreError::Config(s) => write!(f, "Config Error: {}", s),
            StoreError::Scheduler(s) => write!(f, "Scheduler Error: {}", s),
            StoreError::Persist(version) => {
                write!(f, "Persist Error: document version {} was not saved", version)
            }
        }
    }
}

impl Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return StoreError::Http(format!("request timed out. {error}"));
        }
        StoreError::Http(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Parse(error.to_string())
    }
}

impl From<figment::Error> for StoreError {
    fn from(error: figment::Error) -> Self {
        StoreError::Config(error.to_string())
    }
}

impl From<JobSchedulerError> for StoreError {
    fn from(error: JobSchedulerError) -> Self {
        StoreError::Scheduler(error.to_string())
    }
}
