// ABOUTME: Applies one FieldRule to one card node and returns an optional value.
// ABOUTME: Total by construction: missing nodes, bad URLs and failing derived rules all end in None.

//! Field extraction.
//!
//! Key behaviors:
//! - The first descendant of the card matching the rule's selector is used.
//! - Text is trimmed and internal whitespace collapsed.
//! - Empty results are normalized to `None`.
//! - Recoverable problems (malformed URLs, derived rule failures) are pushed
//!   onto the context's warnings; absence on its own is never a warning.

use std::panic::{self, AssertUnwindSafe};

use scraper::ElementRef;

use crate::rules::{DeriveInput, Extract, FieldRule};
use crate::url_resolver::try_resolve;

/// Per-card state shared by every field rule of that card.
pub struct FieldContext<'a> {
    pub base_url: &'a str,
    /// 1-based position of the card in document order.
    pub card_index: usize,
    pub warnings: &'a mut Vec<String>,
}

impl FieldContext<'_> {
    pub fn warn(&mut self, message: String) {
        tracing::warn!(card = self.card_index, "{}", message);
        self.warnings.push(message);
    }
}

/// Collapses runs of whitespace into single spaces.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_whitespace(&el.text().collect::<String>())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}

/// Extracts the value described by `rule` from `card`.
pub fn extract_field(card: ElementRef<'_>, rule: &FieldRule, ctx: &mut FieldContext<'_>) -> Option<String> {
    let matched = card.select(&rule.selector).next()?;

    let value = match &rule.extract {
        Extract::Text => Some(element_text(matched)),
        Extract::Attr(name) => matched.value().attr(name).map(str::to_string),
        Extract::Url(name) => {
            let raw = matched.value().attr(name);
            match try_resolve(raw, ctx.base_url) {
                Ok(resolved) => resolved,
                Err(e) => {
                    ctx.warn(format!(
                        "card {}: field `{}`: {}",
                        ctx.card_index, rule.name, e
                    ));
                    None
                }
            }
        }
        Extract::Derived(derived) => {
            let input = DeriveInput {
                card,
                matched,
                selector: &rule.selector,
            };
            match panic::catch_unwind(AssertUnwindSafe(|| derived.call(&input))) {
                Ok(Ok(value)) => value,
                Ok(Err(e)) => {
                    ctx.warn(format!(
                        "card {}: field `{}`: derived rule `{}` failed: {:#}",
                        ctx.card_index,
                        rule.name,
                        derived.label(),
                        e
                    ));
                    None
                }
                Err(_) => {
                    ctx.warn(format!(
                        "card {}: field `{}`: derived rule `{}` panicked",
                        ctx.card_index,
                        rule.name,
                        derived.label()
                    ));
                    None
                }
            }
        }
    };

    value.and_then(non_empty)
}
