use clap::Parser;
use serde::Serialize;

#[derive(Debug, Parser, Serialize)]
pub struct Cli {
    /// Seconds a fetched document is served before refreshing it
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_sec: Option<u64>,
    /// Deployment host serving the save endpoint
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vercel_url: Option<String>,
    /// One of TRACE, DEBUG, INFO, WARN, ERROR
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_level: Option<String>,
    /// Cron schedule (with seconds) of the background cache refresh
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_schedule: Option<String>,
}
