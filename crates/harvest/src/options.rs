// ABOUTME: Configuration options for the Harvester and the HarvesterBuilder fluent API.
// ABOUTME: Defaults follow the listing sites' expectations: browser User-Agent and a 30 second timeout.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Harvester;
use crate::error::HarvestError;
use crate::sources::SourceRegistry;

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Configuration options for the Harvester.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub accept_non_success: bool,
    pub http_client: Option<reqwest::Client>,
    pub registry: Option<SourceRegistry>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            accept_non_success: false,
            http_client: None,
            registry: None,
        }
    }
}

/// Builder for constructing Harvester instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct HarvesterBuilder {
    opts: Options,
}

impl HarvesterBuilder {
    /// Create a new HarvesterBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Extract from non-2xx pages instead of failing the source.
    pub fn accept_non_success(mut self, accept: bool) -> Self {
        self.opts.accept_non_success = accept;
        self
    }

    /// Use a custom HTTP client. Timeout and User-Agent options are then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Set the source registry. Defaults to the built-in sources.
    pub fn registry(mut self, reg: SourceRegistry) -> Self {
        self.opts.registry = Some(reg);
        self
    }

    /// Build the Harvester with the configured options.
    pub fn build(self) -> Result<Harvester, HarvestError> {
        Harvester::new(self.opts)
    }
}
