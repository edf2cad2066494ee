use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::client::RemoteDocumentStore;
use crate::config::Settings;
use crate::core::document::Document;
use crate::error::{StoreError, StoreResult};

const LOCAL_SAVE_BASE_URL: &str = "http://localhost:3000";

enum Endpoint<'a> {
    Item(&'a str),
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Item(key) => write!(f, "/item/{}", key),
        }
    }
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    key: &'a str,
    value: &'a Document,
}

/// Reads the document from the edge config read API and writes it back
/// through the deployment's save endpoint.
pub struct EdgeConfig {
    http_client: Client,
    read_base_url: String,
    read_token: Option<String>,
    save_url: String,
}

impl EdgeConfig {
    pub fn new(
        read_base_url: String,
        read_token: Option<String>,
        save_url: String,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            read_base_url: read_base_url.trim_end_matches('/').to_string(),
            read_token,
            save_url,
        })
    }

    pub fn from_settings(settings: &Settings) -> StoreResult<Self> {
        EdgeConfig::new(
            settings.edge_config_url.clone(),
            settings.edge_config_token.clone(),
            save_url(settings.vercel_url.as_deref(), &settings.save_endpoint_path),
            Duration::from_secs(settings.remote_timeout_sec),
        )
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.read_base_url, endpoint)
    }
}

/// Save endpoint on the deployment host, or on the local dev server when no
/// host is provided.
pub fn save_url(vercel_url: Option<&str>, path: &str) -> String {
    let base = match vercel_url.filter(|host| !host.is_empty()) {
        Some(host) => format!("https://{}", host),
        None => LOCAL_SAVE_BASE_URL.to_string(),
    };
    format!("{}/{}", base, path.trim_start_matches('/'))
}

#[async_trait]
impl RemoteDocumentStore for EdgeConfig {
    async fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        let url = self.url(&Endpoint::Item(key));

        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.read_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                // A stored JSON null is the same as no document.
                let document = serde_json::from_str::<Option<Document>>(&body)?;
                Ok(document)
            }
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
                debug!("No item stored under '{key}'");
                Ok(None)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Remote(format!("{} {}", status, body)))
            }
        }
    }

    async fn set(&self, key: &str, value: &Document) -> StoreResult<()> {
        let response = self
            .http_client
            .post(&self.save_url)
            .json(&SaveRequest { key, value })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Remote(format!("{} {}", status, body)))
        }
    }
}
