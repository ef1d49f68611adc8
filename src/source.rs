use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use statbar::error::QueryError;
use statbar::stats::QueryState;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, warn};

const MAX_RETRIES: usize = 3;
pub const HTTP_TIMEOUT_SECONDS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

pub struct Fetcher {
    client: Client,
    token: Option<String>,
    backoff_unit: Duration,
}

impl Fetcher {
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("statbar/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            token,
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// Reads and decodes one statistics response. Query parameters only
    /// apply to URL sources.
    pub async fn load_json<T: DeserializeOwned>(
        &self,
        source: &Source,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let body = match source {
            Source::File(path) => fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
            Source::Url(base) => {
                let url = Url::parse_with_params(base, params)
                    .with_context(|| format!("invalid statistics URL {base}"))?;
                self.fetch_text_with_retry(url).await?
            }
        };
        serde_json::from_str(&body)
            .with_context(|| format!("failed to decode statistics from {source}"))
    }

    async fn fetch_text_with_retry(&self, url: Url) -> Result<String> {
        let display = url.to_string();
        self.send_with_retry(url)
            .await?
            .text()
            .await
            .with_context(|| format!("failed to read response body from {display}"))
    }

    /// Retries transport failures and 5xx/429 answers; any other error
    /// status is final on the first attempt.
    async fn send_with_retry(&self, url: Url) -> Result<Response> {
        let mut attempt = 1;
        loop {
            debug!(%url, attempt, "requesting statistics");
            let mut request = self.client.get(url.clone());
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            let failure = match request.send().await {
                Ok(response) if !is_error_status(response.status()) => return Ok(response),
                Ok(response) => AttemptFailure::Status(response.status()),
                Err(err) => AttemptFailure::Transport(err),
            };

            if attempt >= MAX_RETRIES || !failure.is_retryable() {
                return Err(failure.into_fetch_error(&url, attempt).into());
            }
            let backoff = calculate_backoff(attempt, self.backoff_unit);
            warn!(%url, attempt, ?backoff, "statistics request failed, retrying");
            sleep(backoff).await;
            attempt += 1;
        }
    }
}

enum AttemptFailure {
    Status(StatusCode),
    Transport(reqwest::Error),
}

impl AttemptFailure {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Transport(_) => true,
        }
    }

    fn into_fetch_error(self, url: &Url, attempts: usize) -> FetchError {
        let (status, reason) = match self {
            Self::Status(status) => (
                Some(status.as_u16()),
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            ),
            Self::Transport(err) => (None, describe_error(&anyhow::Error::from(err))),
        };
        FetchError {
            url: url.to_string(),
            attempts,
            status,
            reason,
        }
    }
}

/// Final outcome of a URL load. The status is carried as a field so it is
/// reported once, by whoever renders the error.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {url} after {attempts} attempt(s): {reason}")]
struct FetchError {
    url: String,
    attempts: usize,
    status: Option<u16>,
    reason: String,
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Turns the outcome of a load into what the metrics bar observes.
pub fn into_query_state<T>(loaded: Result<T>) -> QueryState<T> {
    match loaded {
        Ok(data) => QueryState::fetched(data),
        Err(err) => {
            let status = err
                .downcast_ref::<FetchError>()
                .and_then(|fetch| fetch.status);
            let mut error = QueryError::new(describe_error(&err));
            if let Some(status) = status {
                error = error.with_status(status);
            }
            QueryState::failed(error)
        }
    }
}

fn calculate_backoff(attempt: usize, unit: Duration) -> Duration {
    const MAX_BACKOFF_EXPONENT: u32 = 10;
    let exponent = u32::try_from(attempt)
        .unwrap_or(MAX_BACKOFF_EXPONENT)
        .min(MAX_BACKOFF_EXPONENT);
    unit.saturating_mul(2_u32.saturating_pow(exponent))
}

fn describe_error(error: &anyhow::Error) -> String {
    let pieces: Vec<String> = error
        .chain()
        .map(ToString::to_string)
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(idx, text)| {
            if idx == 0 {
                text
            } else {
                format!("caused by {text}")
            }
        })
        .collect();

    if pieces.is_empty() {
        format!("{error:?}")
    } else {
        pieces.join(" | ")
    }
}
