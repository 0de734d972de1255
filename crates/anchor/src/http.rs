//! HTTP client for the anchoring microservice

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use tracing::{debug, info};

use crate::{
    config::AnchorConfig,
    error::{AnchorError, Result},
    service::{AnchorReceipt, AnchorRequest, AnchorService, AnchoredEvent, EventQuery},
};

/// Client for the anchoring microservice.
///
/// - `POST {base}/anchor` with an [`AnchorRequest`] body returns an [`AnchorReceipt`]
/// - `GET {base}/batches/{batch_id}/events` returns a list of [`AnchoredEvent`]
///
/// The batch id is percent-encoded as a single path segment.
#[derive(Debug, Clone)]
pub struct HttpAnchorClient {
    base_url: Url,
    http_client: Client,
}

impl HttpAnchorClient {
    /// Create a client from configuration
    pub fn new(config: &AnchorConfig) -> Result<Self> {
        let base_url = Url::parse(&config.service_url)
            .map_err(|e| AnchorError::InvalidUrl(format!("{}: {e}", config.service_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(AnchorError::InvalidUrl(format!(
                "{}: not a base URL",
                config.service_url
            )));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in `new`: the base URL always has path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn anchor_url(&self) -> Url {
        self.endpoint(&["anchor"])
    }

    fn events_url(&self, batch_id: &str) -> Url {
        self.endpoint(&["batches", batch_id, "events"])
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AnchorError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl AnchorService for HttpAnchorClient {
    async fn anchor_batch(&self, request: &AnchorRequest) -> Result<AnchorReceipt> {
        info!(
            batch_id = %request.batch_id,
            leaves = request.leaf_hashes.len(),
            "Submitting batch for anchoring"
        );

        let response = self
            .http_client
            .post(self.anchor_url())
            .json(request)
            .send()
            .await?;
        let receipt = Self::check_status(response)
            .await?
            .json::<AnchorReceipt>()
            .await?;

        info!(
            batch_id = %request.batch_id,
            tx = %receipt.transaction_hash,
            "Batch anchored"
        );
        Ok(receipt)
    }
}

#[async_trait]
impl EventQuery for HttpAnchorClient {
    async fn anchored_events(&self, batch_id: &str) -> Result<Vec<AnchoredEvent>> {
        let response = self
            .http_client
            .get(self.events_url(batch_id))
            .send()
            .await?;
        let events = Self::check_status(response)
            .await?
            .json::<Vec<AnchoredEvent>>()
            .await?;

        debug!(batch_id, count = events.len(), "Fetched anchored events");
        Ok(events)
    }
}
