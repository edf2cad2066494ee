use crate::cli::Cli;
use crate::core::document::{AddressMatching, AddressPolicy};
use crate::error::StoreResult;
use crate::storage::CacheOptions;
use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

const TRACE_LEVELS: [&'static str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
const LOCAL_SETTINGS_YAML_FILE: &str = ".env.local.yaml";

// All settings may be configured via environment variables. Example:
// EDGE_CONFIG_URL="xxx" would set edge_config_url to the xxx value.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    #[serde(default = "default_trace_level")]
    trace_level: String,
    #[serde(default = "default_document_key")]
    pub document_key: String,
    // Base url of the remote store read API
    pub edge_config_url: String,
    pub edge_config_token: Option<String>,
    // Deployment host serving the save endpoint
    pub vercel_url: Option<String>,
    #[serde(default = "default_save_endpoint_path")]
    pub save_endpoint_path: String,
    #[serde(default = "default_cache_ttl_sec")]
    pub cache_ttl_sec: u64,
    #[serde(default = "default_remote_timeout_sec")]
    pub remote_timeout_sec: u64,
    #[serde(default = "default_persist_max_attempts")]
    pub persist_max_attempts: u32,
    #[serde(default = "default_persist_backoff_ms")]
    pub persist_backoff_ms: u64,
    #[serde(default = "default_refresh_schedule")]
    pub refresh_schedule: String,
    #[serde(default = "default_leaderboard_address_matching")]
    pub leaderboard_address_matching: AddressMatching,
    #[serde(default = "default_stats_address_matching")]
    pub stats_address_matching: AddressMatching,
}

impl Settings {
    pub fn new() -> StoreResult<Self> {
        let figment = match Path::new(LOCAL_SETTINGS_YAML_FILE).exists() {
            true => {
                println!(
                    "\n######################################\n\
                       ##   Found '.env.local.yaml' file,  ##\n\
                       ##   loading local configuration.   ##\n\
                       ######################################\n\
                    "
                );
                Figment::new()
                    .merge(Yaml::file(LOCAL_SETTINGS_YAML_FILE))
                    .merge(Env::raw())
            }
            false => Figment::new().merge(Env::raw()),
        };

        Settings::from_figment(figment.merge(Serialized::defaults(Cli::parse())))
    }

    pub fn from_figment(figment: Figment) -> StoreResult<Self> {
        Ok(figment.extract()?)
    }

    pub fn get_trace_level(&self) -> Level {
        get_trace_level(&self.trace_level)
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            document_key: self.document_key.clone(),
            ttl: Duration::from_secs(self.cache_ttl_sec),
            remote_timeout: Duration::from_secs(self.remote_timeout_sec),
            persist_max_attempts: self.persist_max_attempts.max(1),
            persist_backoff: Duration::from_millis(self.persist_backoff_ms),
        }
    }

    pub fn address_policy(&self) -> AddressPolicy {
        AddressPolicy {
            leaderboard: self.leaderboard_address_matching,
            player_stats: self.stats_address_matching,
        }
    }
}

fn get_trace_level(level_str: &str) -> Level {
    match level_str {
        level if level == TRACE_LEVELS[0] => Level::TRACE,
        level if level == TRACE_LEVELS[1] => Level::DEBUG,
        level if level == TRACE_LEVELS[2] => Level::INFO,
        level if level == TRACE_LEVELS[3] => Level::WARN,
        level if level == TRACE_LEVELS[4] => Level::ERROR,
        // Default trace level
        _ => Level::INFO,
    }
}

fn default_trace_level() -> String {
    "INFO".to_string()
}

fn default_document_key() -> String {
    "game-data".to_string()
}

fn default_save_endpoint_path() -> String {
    "/api/update-edge-config".to_string()
}

fn default_cache_ttl_sec() -> u64 {
    30
}

fn default_remote_timeout_sec() -> u64 {
    5
}

fn default_persist_max_attempts() -> u32 {
    5
}

fn default_persist_backoff_ms() -> u64 {
    500
}

fn default_refresh_schedule() -> String {
    "0/15 * * * * *".to_string()
}

fn default_leaderboard_address_matching() -> AddressMatching {
    AddressMatching::CaseInsensitive
}

fn default_stats_address_matching() -> AddressMatching {
    AddressMatching::Exact
}
