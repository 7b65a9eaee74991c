//! Content extraction collaborator: fetches and distills full page
//! content for a URL.
//!
//! Extraction is best-effort enrichment: a URL that fails to scrape is
//! simply omitted from the enriched context while its citation is kept.
//! All extractor failures map to [`AggregatorError::Scrape`], which is
//! terminal and never retried.

use crate::error::AggregatorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default poll interval while waiting for an extraction job.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default maximum polls before a job is declared stuck.
const MAX_POLLS: u32 = 15;

/// Structured article extracted from a page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "keyPoints")]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, rename = "publishDate")]
    pub publish_date: Option<String>,
}

/// A page content extraction collaborator.
pub trait ContentExtractor: Send + Sync {
    /// Extract a structured article from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Scrape`] when the page cannot be
    /// fetched or the extraction job fails or times out.
    fn extract(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Article, AggregatorError>> + Send;
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScrapeAccepted {
    #[serde(rename = "jobId")]
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    #[serde(default)]
    data: Option<Article>,
    #[serde(default)]
    error: Option<String>,
}

/// Firecrawl-style extraction client: submit a job, then poll until it
/// completes.
pub struct FirecrawlExtractor {
    base_url: String,
    client: reqwest::Client,
    poll_interval: Duration,
    max_polls: u32,
}

impl FirecrawlExtractor {
    /// # Errors
    ///
    /// Returns [`AggregatorError::Network`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AggregatorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregatorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            poll_interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        })
    }

    /// Override the poll cadence.
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn submit(&self, url: &str) -> Result<String, AggregatorError> {
        let response = self
            .client
            .post(format!("{}/v0/scrape", self.base_url))
            .json(&ScrapeRequest { url })
            .send()
            .await
            .map_err(|e| AggregatorError::Scrape(format!("submit failed for {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(AggregatorError::Scrape(format!(
                "submit for {url}: HTTP {}",
                response.status()
            )));
        }

        let accepted: ScrapeAccepted = response
            .json()
            .await
            .map_err(|e| AggregatorError::Scrape(format!("submit response for {url}: {e}")))?;
        Ok(accepted.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, AggregatorError> {
        let response = self
            .client
            .get(format!("{}/v0/jobs/{job_id}", self.base_url))
            .send()
            .await
            .map_err(|e| AggregatorError::Scrape(format!("poll failed for job {job_id}: {e}")))?;

        if !response.status().is_success() {
            return Err(AggregatorError::Scrape(format!(
                "poll for job {job_id}: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AggregatorError::Scrape(format!("poll response for job {job_id}: {e}")))
    }
}

impl ContentExtractor for FirecrawlExtractor {
    async fn extract(&self, url: &str) -> Result<Article, AggregatorError> {
        let job_id = self.submit(url).await?;
        debug!(%url, %job_id, "extraction job submitted");

        for _ in 0..self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            let status = self.poll(&job_id).await?;
            match status.status.as_str() {
                "completed" => {
                    return status.data.ok_or_else(|| {
                        AggregatorError::Scrape(format!(
                            "job {job_id} completed without article data"
                        ))
                    });
                }
                "failed" => {
                    return Err(AggregatorError::Scrape(format!(
                        "job {job_id} failed: {}",
                        status.error.unwrap_or_else(|| "unknown error".into())
                    )));
                }
                _ => {}
            }
        }

        Err(AggregatorError::Scrape(format!(
            "job {job_id} still pending after {} polls",
            self.max_polls
        )))
    }
}

/// Extract articles from several URLs, dropping the ones that fail.
/// Returned pairs keep the input order of the URLs that succeeded.
pub async fn extract_available<E: ContentExtractor>(
    extractor: &E,
    urls: &[String],
) -> Vec<(String, Article)> {
    let mut articles = Vec::new();
    for url in urls {
        match extractor.extract(url).await {
            Ok(article) => articles.push((url.clone(), article)),
            Err(e) => warn!(%url, error = %e, "content extraction failed, omitting page"),
        }
    }
    articles
}
