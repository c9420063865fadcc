// ABOUTME: The Harvester client: fetches each source's listing page and runs the extraction pipeline.
// ABOUTME: harvest_all fans out one future per source and reports each outcome independently.

use anyhow::anyhow;
use futures::future::join_all;

use crate::adapter::SourceAdapter;
use crate::error::HarvestError;
use crate::fetch::{fetch, FetchOptions};
use crate::options::{HarvesterBuilder, Options};
use crate::pipeline::{run, ExtractionResult};
use crate::sources::{load_builtin_sources, SourceRegistry};

/// Outcome of harvesting one source in a batch.
#[derive(Debug)]
pub struct SourceOutcome {
    pub key: String,
    pub result: Result<ExtractionResult, HarvestError>,
}

/// Fetches listing pages and extracts records from them.
#[derive(Debug, Clone)]
pub struct Harvester {
    opts: Options,
    http_client: reqwest::Client,
    registry: SourceRegistry,
}

impl Harvester {
    /// Create a new HarvesterBuilder for configuring the harvester.
    pub fn builder() -> HarvesterBuilder {
        HarvesterBuilder::new()
    }

    /// Create a new Harvester with the given options.
    pub fn new(opts: Options) -> Result<Self, HarvestError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    HarvestError::config("harvester", "Configure", Some(anyhow!("HTTP client: {}", e)))
                })?,
        };

        let registry = match opts.registry.clone() {
            Some(registry) => registry,
            None => load_builtin_sources()?,
        };

        Ok(Self {
            opts,
            http_client,
            registry,
        })
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    fn adapter(&self, key: &str) -> Result<&SourceAdapter, HarvestError> {
        self.registry.get(key).ok_or_else(|| {
            HarvestError::config(
                key,
                "Lookup",
                Some(anyhow!(
                    "unknown source (known: {})",
                    self.registry.keys().collect::<Vec<_>>().join(", ")
                )),
            )
        })
    }

    /// Fetch the listing page of the registered source `key` and extract it.
    pub async fn harvest(&self, key: &str) -> Result<ExtractionResult, HarvestError> {
        let adapter = self.adapter(key)?;
        self.harvest_adapter(adapter).await
    }

    /// Fetch `adapter.base_url` and extract it with `adapter`.
    pub async fn harvest_adapter(
        &self,
        adapter: &SourceAdapter,
    ) -> Result<ExtractionResult, HarvestError> {
        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
            accept_non_success: self.opts.accept_non_success,
        };
        let page = fetch(&self.http_client, &adapter.name, &adapter.base_url, &fetch_opts).await?;
        run(&page.text_utf8(), adapter)
    }

    /// Extract a page already in hand with the registered source `key`.
    pub fn extract_html(&self, key: &str, html: &str) -> Result<ExtractionResult, HarvestError> {
        run(html, self.adapter(key)?)
    }

    /// Harvest several sources concurrently. Outcomes come back in `keys` order;
    /// a failing source never affects the others.
    pub async fn harvest_all<S: AsRef<str>>(&self, keys: &[S]) -> Vec<SourceOutcome> {
        let tasks = keys.iter().map(|key| async move {
            let key = key.as_ref();
            let result = self.harvest(key).await;
            if let Err(ref e) = result {
                tracing::warn!(source = key, error = %e, "source failed");
            }
            SourceOutcome {
                key: key.to_string(),
                result,
            }
        });
        join_all(tasks).await
    }

    /// Harvest every registered source.
    pub async fn harvest_registered(&self) -> Vec<SourceOutcome> {
        let keys: Vec<String> = self.registry.keys().map(str::to_string).collect();
        self.harvest_all(&keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn registry_for(server: &MockServer) -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry.register(
            SourceAdapter::builder("ok", server.url("/ok/"))
                .cards("li")
                .text("title", "a")
                .required()
                .url("link", "a", "href")
                .build()
                .unwrap(),
        );
        registry.register(
            SourceAdapter::builder("broken", server.url("/broken/"))
                .container("#missing")
                .cards("li")
                .text("title", "a")
                .build()
                .unwrap(),
        );
        registry
    }

    #[tokio::test]
    async fn harvest_fetches_and_extracts() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ok/");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(r#"<ul><li><a href="t/1">One</a></li><li><a href="/t/2">Two</a></li></ul>"#);
        });

        let harvester = Harvester::builder().registry(registry_for(&server)).build().unwrap();
        let result = harvester.harvest("ok").await.unwrap();

        assert_eq!(result.card_count, 2);
        assert_eq!(result.records[0].get("title"), Some("One"));
        assert_eq!(
            result.records[0].get("link").map(str::to_string),
            Some(server.url("/ok/t/1"))
        );
        assert_eq!(
            result.records[1].get("link").map(str::to_string),
            Some(server.url("/t/2"))
        );
    }

    #[tokio::test]
    async fn harvest_unknown_key_is_config_error() {
        let server = MockServer::start();
        let harvester = Harvester::builder().registry(registry_for(&server)).build().unwrap();
        let err = harvester.harvest("ungm").await.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("known: ok, broken"));
    }

    #[tokio::test]
    async fn harvest_all_isolates_failures() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ok/");
            then.status(200).body("<ul><li><a href='/a'>A</a></li></ul>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/broken/");
            then.status(200).body("<ul><li><a href='/b'>B</a></li></ul>");
        });

        let harvester = Harvester::builder().registry(registry_for(&server)).build().unwrap();
        let outcomes = harvester.harvest_all(&["broken", "ok"]).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].key, "broken");
        assert!(outcomes[0].result.as_ref().unwrap_err().is_container_not_found());
        assert_eq!(outcomes[1].key, "ok");
        assert_eq!(outcomes[1].result.as_ref().unwrap().records.len(), 1);
    }

    #[test]
    fn extract_html_uses_registered_adapter() {
        let harvester = Harvester::builder().build().unwrap();
        let result = harvester
            .extract_html(
                "bdjobs",
                r#"<app-tender-card><div title="LGED">LGED</div><a href="/t/9">Road repair</a></app-tender-card>"#,
            )
            .unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].get("link"), Some("https://bdjobs.com/t/9"));
    }
}
