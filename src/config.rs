use crate::query::DEFAULT_API_BASE;
use crate::word::TextFormat;
use std::time::Duration;

/// Which fetched pages a cursor keeps around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Every page access goes to the network.
    Disabled,
    /// Keep every page of the current query.
    #[default]
    Unbounded,
    /// Keep the `n` most recently used pages.
    Bounded(usize),
}

/// Settings shared by the HTTP fetcher and the cursor built on top of it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub format: TextFormat,
    pub cache: CachePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
            format: TextFormat::default(),
            cache: CachePolicy::default(),
        }
    }
}
