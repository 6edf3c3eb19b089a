use std::time::Duration;

use reqwest::header;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CoordinatorConfig;
use crate::errors::FleetError;
use crate::models::RegisteredExecutor;

use super::{RegistryView, RunnerRegistry};

const USER_AGENT: &str = concat!("fleetctl/", env!("CARGO_PKG_VERSION"));

/// REST client for the coordinator's runner registration API:
/// `GET {base}/actions/runners?per_page=N&page=M` with bearer auth, paginated
/// until `total_count` is covered or a short page arrives.
pub struct CoordinatorClient {
    http: reqwest::Client,
    endpoint: Option<Endpoint>,
    page_size: u32,
}

struct Endpoint {
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RunnersPage {
    total_count: usize,
    #[serde(default)]
    runners: Vec<RunnerRecord>,
}

#[derive(Debug, Deserialize)]
struct RunnerRecord {
    name: String,
    status: String,
    #[serde(default)]
    busy: bool,
}

impl CoordinatorClient {
    /// Builds the client from configuration. Missing URL or token is not an
    /// error: the client comes up unconfigured and answers `Unavailable`.
    pub fn from_config(cfg: &CoordinatorConfig) -> Result<Self, FleetError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| FleetError::Unavailable(e.to_string()))?;
        let endpoint = match (&cfg.url, &cfg.token) {
            (Some(url), Some(token)) => Some(Endpoint {
                base_url: url.trim_end_matches('/').to_string(),
                token: token.clone(),
            }),
            _ => None,
        };
        Ok(Self {
            http,
            endpoint,
            page_size: cfg.page_size.clamp(1, 100),
        })
    }

    async fn fetch_all(&self, ep: &Endpoint) -> Result<Vec<RunnerRecord>, reqwest::Error> {
        let url = format!("{}/actions/runners", ep.base_url);
        let mut records = Vec::new();
        let mut page = 1u32;
        loop {
            let body: RunnersPage = self
                .http
                .get(&url)
                .bearer_auth(&ep.token)
                .header(header::ACCEPT, "application/vnd.github+json")
                .query(&[
                    ("per_page", self.page_size.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            let got = body.runners.len();
            records.extend(body.runners);
            debug!(page, got, total = body.total_count, "runner page fetched");
            if got < self.page_size as usize || records.len() >= body.total_count {
                return Ok(records);
            }
            page += 1;
        }
    }
}

#[async_trait::async_trait]
impl RunnerRegistry for CoordinatorClient {
    async fn list_registered(&self, prefix: &str) -> RegistryView {
        let Some(ep) = &self.endpoint else {
            return RegistryView::Unavailable {
                reason: "coordinator URL or token not configured".to_string(),
            };
        };
        match self.fetch_all(ep).await {
            Ok(records) => {
                let executors = records
                    .into_iter()
                    .filter(|r| r.name.starts_with(prefix))
                    .map(|r| RegisteredExecutor {
                        online: r.status.eq_ignore_ascii_case("online"),
                        busy: r.busy,
                        name: r.name,
                    })
                    .collect();
                RegistryView::Available(executors)
            }
            Err(e) => {
                warn!(error = %e, "coordinator query failed, registration data unavailable");
                RegistryView::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}
