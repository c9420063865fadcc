// ABOUTME: Source catalog: the built-in adapters embedded as JSON and user-supplied adapter files.
// ABOUTME: SourceRegistry keeps adapters in registration order and looks them up by key.

//! Source registry and loaders.
//!
//! Built-in adapters live in `data/sources.json` and are compiled into the
//! binary. Additional catalogs use the same schema (a JSON array of
//! [`AdapterSpec`]) and can replace built-ins by reusing their key.

use std::fs;
use std::path::Path;

use anyhow::anyhow;

use crate::adapter::{AdapterSpec, SourceAdapter};
use crate::error::HarvestError;

/// Embedded JSON describing the built-in sources.
const BUILTIN_SOURCES_JSON: &str = include_str!("../data/sources.json");

/// Adapters keyed by source key, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    adapters: Vec<SourceAdapter>,
}

impl SourceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter, replacing any existing adapter with the same key.
    pub fn register(&mut self, adapter: SourceAdapter) {
        match self.adapters.iter_mut().find(|a| a.key == adapter.key) {
            Some(slot) => *slot = adapter,
            None => self.adapters.push(adapter),
        }
    }

    /// Looks up an adapter by key.
    pub fn get(&self, key: &str) -> Option<&SourceAdapter> {
        self.adapters.iter().find(|a| a.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceAdapter> {
        self.adapters.iter()
    }

    /// Returns the number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapters are registered.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Parses a JSON catalog into adapters. `origin` names the catalog in errors.
pub fn parse_sources_json(json: &str, origin: &str) -> Result<Vec<SourceAdapter>, HarvestError> {
    let specs: Vec<AdapterSpec> = serde_json::from_str(json).map_err(|e| {
        HarvestError::config(origin, "Configure", Some(anyhow!("invalid source catalog: {}", e)))
    })?;
    specs.iter().map(SourceAdapter::from_spec).collect()
}

/// Loads a JSON catalog from disk.
pub fn load_sources_file(path: &Path) -> Result<Vec<SourceAdapter>, HarvestError> {
    let origin = path.display().to_string();
    let json = fs::read_to_string(path).map_err(|e| {
        HarvestError::config(&origin, "Configure", Some(anyhow!("cannot read: {}", e)))
    })?;
    parse_sources_json(&json, &origin)
}

/// Loads the built-in adapters.
pub fn load_builtin_sources() -> Result<SourceRegistry, HarvestError> {
    let mut registry = SourceRegistry::new();
    for adapter in parse_sources_json(BUILTIN_SOURCES_JSON, "builtin")? {
        registry.register(adapter);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Extract;

    #[test]
    fn builtin_sources_load() {
        let registry = load_builtin_sources().unwrap();
        let keys: Vec<&str> = registry.keys().collect();
        assert_eq!(keys, vec!["bdjobs", "care", "pksf"]);
    }

    #[test]
    fn builtin_care_scopes_to_active_tab() {
        let registry = load_builtin_sources().unwrap();
        let care = registry.get("care").unwrap();
        assert_eq!(
            care.container_css.as_deref(),
            Some("div#project1.tab-pane.show.active")
        );
        let title = care.fields.iter().find(|f| f.name == "title").unwrap();
        assert!(title.required);
        assert!(matches!(title.extract, Extract::Derived(_)));
    }

    #[test]
    fn register_replaces_same_key() {
        let mut registry = load_builtin_sources().unwrap();
        let replacement = SourceAdapter::builder("pksf", "https://pksf.org.bd/")
            .name("PKSF notices")
            .cards("article.post")
            .text("title", "h2.entry-title a")
            .build()
            .unwrap();
        registry.register(replacement);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("pksf").unwrap().name, "PKSF notices");
    }

    #[test]
    fn unknown_key_is_none() {
        let registry = load_builtin_sources().unwrap();
        assert!(registry.get("ungm").is_none());
    }

    #[test]
    fn malformed_catalog_is_config_error() {
        let err = parse_sources_json("{ not json", "inline").unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.source_name, "inline");
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_sources_file(Path::new("/nonexistent/sources.json")).unwrap_err();
        assert!(err.is_config());
    }
}
