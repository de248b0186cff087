use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::query::Endpoints;
use crate::word::{TextFormat, Word, parse_definitions, parse_suggestions};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// Turns one fully formed URL into the words it lists.
///
/// Implementations must not cache: the cursor owns all caching decisions.
pub trait FetchWords {
    fn fetch_words(&self, url: &str) -> impl Future<Output = Result<Vec<Word>, FetchError>> + Send;
}

/// Fetcher backed by a pooled `reqwest` client.
///
/// The client lives as long as the fetcher, so a cursor reuses one connection
/// pool for every page of every query.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    endpoints: Endpoints,
    format: TextFormat,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoints: Endpoints::new(config.api_base.clone()),
            format: config.format,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Terms the service suggests for a partially typed `prefix`.
    pub async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>, FetchError> {
        let url = self.endpoints.autocomplete_url(prefix);
        let body = self.get_body(&url).await?;
        let terms = parse_suggestions(&body)?;
        debug!(%url, count = terms.len(), "fetched suggestions");
        Ok(terms)
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() && !body_reports_error(&body) {
            return Err(FetchError::Status(status));
        }
        Ok(body)
    }
}

impl FetchWords for HttpFetcher {
    async fn fetch_words(&self, url: &str) -> Result<Vec<Word>, FetchError> {
        let body = self.get_body(url).await?;
        let words = parse_definitions(&body, self.format)?;
        debug!(%url, count = words.len(), "fetched definitions");
        Ok(words)
    }
}

/// Error payloads come with 4xx/5xx statuses; their message beats the status.
fn body_reports_error(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|value| value.get("error").is_some())
        .unwrap_or(false)
}

/// Serves canned pages by URL without touching the network.
///
/// Unknown URLs answer with an empty list, which is how the service signals the
/// end of a result set. Every call is recorded.
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: HashMap<String, Result<Vec<Word>, String>>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, words: Vec<Word>) -> Self {
        self.pages.insert(url.into(), Ok(words));
        self
    }

    /// Makes requests for `url` fail with a service error.
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.pages.insert(url.into(), Err(message.into()));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl FetchWords for MemorySource {
    async fn fetch_words(&self, url: &str) -> Result<Vec<Word>, FetchError> {
        self.requests.lock().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(words)) => Ok(words.clone()),
            Some(Err(message)) => Err(FetchError::Service(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
