// ABOUTME: SourceAdapter: the immutable per-site configuration (base URL, container, cards, field rules).
// ABOUTME: Built in code through SourceAdapterBuilder or from serde specs; selectors compile up front.

//! Source adapters.
//!
//! An adapter is constructed once, before any run, and never changes. All
//! selectors are compiled at construction so a typo in a selector is a
//! configuration error, not a per-page surprise.

use anyhow::anyhow;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::derive;
use crate::error::HarvestError;
use crate::rules::{compile_selector, Derived, Extract, FieldRule};

const STAGE: &str = "Configure";

/// How to extract records from one site's listing page.
#[derive(Debug, Clone)]
pub struct SourceAdapter {
    pub key: String,
    pub name: String,
    pub base_url: String,
    pub container_css: Option<String>,
    pub container: Option<Selector>,
    pub card_css: String,
    pub cards: Selector,
    pub fields: Vec<FieldRule>,
}

impl SourceAdapter {
    /// Starts a builder for the source `key`, fetched from and resolved against `base_url`.
    pub fn builder(key: impl Into<String>, base_url: impl Into<String>) -> SourceAdapterBuilder {
        SourceAdapterBuilder::new(key, base_url)
    }

    /// Builds an adapter from its declarative form.
    pub fn from_spec(spec: &AdapterSpec) -> Result<Self, HarvestError> {
        let mut builder = SourceAdapter::builder(&spec.key, &spec.base_url).cards(&spec.cards);
        if let Some(name) = &spec.name {
            builder = builder.name(name);
        }
        if let Some(container) = &spec.container {
            builder = builder.container(container);
        }
        for field in &spec.fields {
            let extract = match &field.extract {
                ExtractSpec::Text => Extract::Text,
                ExtractSpec::Attr { name } => Extract::Attr(name.clone()),
                ExtractSpec::Url { attr } => Extract::Url(attr.clone()),
                ExtractSpec::Derived { name, index } => {
                    let derived = derive::lookup(name, *index).map_err(|e| {
                        HarvestError::config(
                            &spec.key,
                            STAGE,
                            Some(e.context(format!("field `{}`", field.name))),
                        )
                    })?;
                    Extract::Derived(derived)
                }
            };
            builder = builder.field(&field.name, &field.selector, extract);
            if field.required {
                builder = builder.required();
            }
        }
        builder.build()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

struct PendingField {
    name: String,
    css: String,
    extract: Extract,
    required: bool,
}

/// Fluent builder for [`SourceAdapter`]. Nothing is validated until `build`.
pub struct SourceAdapterBuilder {
    key: String,
    name: Option<String>,
    base_url: String,
    container: Option<String>,
    cards: Option<String>,
    fields: Vec<PendingField>,
}

impl SourceAdapterBuilder {
    fn new(key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: None,
            base_url: base_url.into(),
            container: None,
            cards: None,
            fields: Vec::new(),
        }
    }

    /// Human-readable source name; defaults to the key.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Scope card lookup to the first element matching `css`.
    pub fn container(mut self, css: impl Into<String>) -> Self {
        self.container = Some(css.into());
        self
    }

    /// Selector for the repeated card nodes.
    pub fn cards(mut self, css: impl Into<String>) -> Self {
        self.cards = Some(css.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, css: impl Into<String>, extract: Extract) -> Self {
        self.fields.push(PendingField {
            name: name.into(),
            css: css.into(),
            extract,
            required: false,
        });
        self
    }

    pub fn text(self, name: impl Into<String>, css: impl Into<String>) -> Self {
        self.field(name, css, Extract::Text)
    }

    pub fn attr(self, name: impl Into<String>, css: impl Into<String>, attr: impl Into<String>) -> Self {
        self.field(name, css, Extract::Attr(attr.into()))
    }

    pub fn url(self, name: impl Into<String>, css: impl Into<String>, attr: impl Into<String>) -> Self {
        self.field(name, css, Extract::Url(attr.into()))
    }

    pub fn derived(self, name: impl Into<String>, css: impl Into<String>, derived: Derived) -> Self {
        self.field(name, css, Extract::Derived(derived))
    }

    /// Marks the most recently added field as required.
    pub fn required(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.required = true;
        }
        self
    }

    pub fn build(self) -> Result<SourceAdapter, HarvestError> {
        let key = self.key;

        if key.trim().is_empty() {
            return Err(HarvestError::config(
                "<unnamed>",
                STAGE,
                Some(anyhow!("source key must not be empty")),
            ));
        }

        match Url::parse(&self.base_url) {
            Ok(u) if u.has_host() => {}
            Ok(_) => {
                return Err(HarvestError::invalid_url(
                    &key,
                    STAGE,
                    Some(anyhow!("base URL `{}` has no host", self.base_url)),
                ))
            }
            Err(e) => {
                return Err(HarvestError::invalid_url(
                    &key,
                    STAGE,
                    Some(anyhow!("base URL `{}`: {}", self.base_url, e)),
                ))
            }
        }

        let card_css = self.cards.ok_or_else(|| {
            HarvestError::config(&key, STAGE, Some(anyhow!("no card selector configured")))
        })?;
        let cards = compile_selector(&card_css)
            .map_err(|e| HarvestError::invalid_selector(&key, STAGE, Some(e.context("cards"))))?;

        let container = match &self.container {
            Some(css) => Some(compile_selector(css).map_err(|e| {
                HarvestError::invalid_selector(&key, STAGE, Some(e.context("container")))
            })?),
            None => None,
        };

        let mut fields = Vec::with_capacity(self.fields.len());
        for pending in self.fields {
            if fields.iter().any(|f: &FieldRule| f.name == pending.name) {
                return Err(HarvestError::config(
                    &key,
                    STAGE,
                    Some(anyhow!("duplicate field `{}`", pending.name)),
                ));
            }
            let mut rule = FieldRule::new(&pending.name, &pending.css, pending.extract).map_err(|e| {
                HarvestError::invalid_selector(
                    &key,
                    STAGE,
                    Some(e.context(format!("field `{}`", pending.name))),
                )
            })?;
            rule.required = pending.required;
            fields.push(rule);
        }

        Ok(SourceAdapter {
            name: self.name.unwrap_or_else(|| key.clone()),
            key,
            base_url: self.base_url,
            container_css: self.container,
            container,
            card_css,
            cards,
            fields,
        })
    }
}

/// Declarative form of a source adapter, as stored in JSON catalogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub container: Option<String>,
    pub cards: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Declarative form of one field rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub extract: ExtractSpec,
    #[serde(default)]
    pub required: bool,
}

/// Declarative form of [`Extract`]; derived rules refer to a named derivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractSpec {
    #[default]
    Text,
    Attr {
        name: String,
    },
    Url {
        attr: String,
    },
    Derived {
        name: String,
        #[serde(default)]
        index: Option<usize>,
    },
}
