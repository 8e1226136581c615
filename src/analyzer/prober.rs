//! Link classifier and prober
//!
//! Classifies each discovered link as internal or external and probes it for
//! an HTTP status. A failed probe only degrades that link's status to the
//! unreachable sentinel.

use crate::config::ProberSettings;
use crate::model::{Link, UNREACHABLE_STATUS};
use crate::url::is_external;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Probes link targets with bounded concurrency
#[derive(Debug, Clone)]
pub struct LinkProber {
    client: Client,
    max_concurrency: usize,
    timeout: Duration,
}

impl LinkProber {
    pub fn new(client: Client, max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            client,
            max_concurrency: max_concurrency.max(1),
            timeout,
        }
    }

    /// Creates a prober from the `[prober]` configuration section
    pub fn from_settings(client: Client, settings: &ProberSettings) -> Self {
        Self::new(
            client,
            settings.max_concurrent_probes as usize,
            Duration::from_secs(settings.probe_timeout_secs),
        )
    }

    /// Classifies and probes every target
    ///
    /// At most `max_concurrency` probes are in flight at once. The returned
    /// links are in the same order as `targets`.
    pub async fn probe_all(&self, base: &Url, targets: Vec<Url>) -> Vec<Link> {
        stream::iter(targets)
            .map(|target| async move { self.classify(base, &target).await })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }

    /// Classifies one target relative to `base` and probes its status
    pub async fn classify(&self, base: &Url, target: &Url) -> Link {
        Link {
            href: target.to_string(),
            is_external: is_external(base, target),
            status_code: self.probe_status(target).await,
        }
    }

    /// Gets the HTTP status of `target`
    ///
    /// Sends a HEAD request; servers that reject HEAD (405 / 501) get one GET.
    /// Any transport failure yields `UNREACHABLE_STATUS`.
    pub async fn probe_status(&self, target: &Url) -> u16 {
        match self.send(self.client.head(target.clone())).await {
            Some(StatusCode::METHOD_NOT_ALLOWED) | Some(StatusCode::NOT_IMPLEMENTED) => self
                .send(self.client.get(target.clone()))
                .await
                .map(|status| status.as_u16())
                .unwrap_or(UNREACHABLE_STATUS),
            Some(status) => status.as_u16(),
            None => UNREACHABLE_STATUS,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Option<StatusCode> {
        match request.timeout(self.timeout).send().await {
            Ok(response) => Some(response.status()),
            Err(e) => {
                tracing::debug!("Probe failed: {}", e);
                None
            }
        }
    }
}
