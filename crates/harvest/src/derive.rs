// ABOUTME: Named derived-value functions that source configuration files can refer to by name.
// ABOUTME: Covers positional access (nth match), parent text and an element's own text.

use anyhow::{anyhow, bail};
use scraper::{ElementRef, Node};

use crate::field::{element_text, normalize_whitespace};
use crate::rules::{DeriveInput, Derived};

/// Names accepted by [`lookup`].
pub const DERIVATIONS: &[&str] = &["nth_text", "parent_text", "own_text"];

/// Builds the named derivation.
///
/// - `nth_text` (needs `index`, 0-based): text of the nth element in the card
///   matching the rule's selector. `None` when the card has fewer matches.
/// - `parent_text`: text of the matched element's parent.
/// - `own_text`: text nodes directly inside the matched element, skipping
///   nested elements.
pub fn lookup(name: &str, index: Option<usize>) -> anyhow::Result<Derived> {
    match name {
        "nth_text" => {
            let index = index.ok_or_else(|| anyhow!("`nth_text` needs an `index`"))?;
            Ok(nth_text(index))
        }
        "parent_text" => Ok(Derived::new("parent_text", parent_text)),
        "own_text" => Ok(Derived::new("own_text", own_text)),
        other => bail!(
            "unknown derivation `{}` (expected one of: {})",
            other,
            DERIVATIONS.join(", ")
        ),
    }
}

/// Text of the `index`-th match (0-based) of the rule's selector within the card.
pub fn nth_text(index: usize) -> Derived {
    Derived::new(format!("nth_text[{}]", index), move |input| {
        Ok(input
            .card
            .select(input.selector)
            .nth(index)
            .map(element_text))
    })
}

fn parent_text(input: &DeriveInput<'_>) -> anyhow::Result<Option<String>> {
    Ok(input
        .matched
        .parent()
        .and_then(ElementRef::wrap)
        .map(element_text))
}

fn own_text(input: &DeriveInput<'_>) -> anyhow::Result<Option<String>> {
    let text: String = input
        .matched
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Some(normalize_whitespace(&text)))
}
