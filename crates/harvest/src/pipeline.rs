// ABOUTME: The extraction pipeline: parse, scope to the container, enumerate cards, build records.
// ABOUTME: Fatal problems return HarvestError; per-card problems become warnings on the result.

use anyhow::anyhow;
use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::adapter::SourceAdapter;
use crate::error::HarvestError;
use crate::field::FieldContext;
use crate::record::{build_record, Record};

/// Everything one run over one page produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub source_name: String,
    pub records: Vec<Record>,
    /// Number of card nodes located, including cards later skipped.
    pub card_count: usize,
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builds the document tree.
///
/// html5ever recovers from nearly any markup, so the only input treated as
/// unparsable is one with no markup at all.
pub fn parse_document(html: &str, source_name: &str) -> Result<Html, HarvestError> {
    if html.trim().is_empty() {
        return Err(HarvestError::parse(
            source_name,
            "Parse",
            Some(anyhow!("document is empty")),
        ));
    }
    Ok(Html::parse_document(html))
}

/// Runs `adapter` over `html`.
pub fn run(html: &str, adapter: &SourceAdapter) -> Result<ExtractionResult, HarvestError> {
    let document = parse_document(html, &adapter.name)?;
    tracing::debug!(source = %adapter.name, bytes = html.len(), "parsed document");
    extract_document(&document, adapter)
}

/// Runs `adapter` over an already parsed document.
pub fn extract_document(
    document: &Html,
    adapter: &SourceAdapter,
) -> Result<ExtractionResult, HarvestError> {
    let root = document.root_element();

    let scope: ElementRef<'_> = match &adapter.container {
        Some(container) => root.select(container).next().ok_or_else(|| {
            HarvestError::container_not_found(
                &adapter.name,
                "Scope",
                Some(anyhow!(
                    "no element matches `{}`",
                    adapter.container_css.as_deref().unwrap_or_default()
                )),
            )
        })?,
        None => root,
    };

    let cards: Vec<ElementRef<'_>> = scope.select(&adapter.cards).collect();
    let card_count = cards.len();
    tracing::debug!(source = %adapter.name, cards = card_count, "enumerated cards");

    let mut records = Vec::with_capacity(card_count);
    let mut warnings = Vec::new();

    if cards.is_empty() {
        let note = format!(
            "empty listing: no cards match `{}`",
            adapter.card_css
        );
        tracing::warn!(source = %adapter.name, "{}", note);
        warnings.push(note);
    }

    for (i, card) in cards.into_iter().enumerate() {
        let mut ctx = FieldContext {
            base_url: &adapter.base_url,
            card_index: i + 1,
            warnings: &mut warnings,
        };
        match build_record(card, &adapter.fields, &mut ctx) {
            Ok(record) => records.push(record),
            Err(missing) => ctx.warn(format!("{}; card skipped", missing)),
        }
    }

    tracing::info!(
        source = %adapter.name,
        cards = card_count,
        records = records.len(),
        warnings = warnings.len(),
        "extraction finished"
    );

    Ok(ExtractionResult {
        source_name: adapter.name.clone(),
        records,
        card_count,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn adapter() -> SourceAdapter {
        SourceAdapter::builder("test", "https://tenders.example.org/list/")
            .container("#main-content")
            .cards(".item")
            .text("title", "h3 a")
            .required()
            .url("link", "h3 a", "href")
            .text("likes", ".sl-count")
            .build()
            .unwrap()
    }

    #[test]
    fn blank_html_is_fatal_parse_error() {
        let err = run("  \n ", &adapter()).unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.stage, "Parse");
        assert_eq!(err.source_name, "test");
    }

    #[test]
    fn missing_container_is_fatal() {
        let err = run("<html><body><div class='item'></div></body></html>", &adapter()).unwrap_err();
        assert!(err.is_container_not_found());
        assert!(err.to_string().contains("#main-content"));
    }

    #[test]
    fn cards_outside_container_are_ignored() {
        let html = r#"
            <div class="item"><h3><a href="/x">outside</a></h3></div>
            <div id="main-content">
                <div class="item"><h3><a href="/t/1">inside</a></h3></div>
            </div>"#;
        let result = run(html, &adapter()).unwrap();
        assert_eq!(result.card_count, 1);
        assert_eq!(result.records[0].get("title"), Some("inside"));
        assert_eq!(
            result.records[0].get("link"),
            Some("https://tenders.example.org/t/1")
        );
    }

    #[test]
    fn empty_listing_warns_once() {
        let result = run("<div id='main-content'><p>No tenders</p></div>", &adapter()).unwrap();
        assert_eq!(result.records, vec![]);
        assert_eq!(result.card_count, 0);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("empty listing"));
    }

    #[test]
    fn no_container_uses_whole_document() {
        let adapter = SourceAdapter::builder("flat", "https://a.b/")
            .cards("li")
            .text("name", "span")
            .build()
            .unwrap();
        let result = run("<ul><li><span>a</span></li><li></li></ul>", &adapter).unwrap();
        assert_eq!(result.card_count, 2);
        assert_eq!(result.records.len(), 2);
        assert!(result.records[1].is_blank());
        assert!(result.warnings.is_empty());
    }
}
