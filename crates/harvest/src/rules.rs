// ABOUTME: Declarative field rules: a named selector plus how to turn the matched node into a value.
// ABOUTME: Derived rules wrap a shared closure so positional fields need no special pipeline branch.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use scraper::{ElementRef, Selector};

/// Compiles a CSS selector, turning the borrowed scraper error into an owned one.
pub fn compile_selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("`{}`: {}", css, e))
}

/// What a derived function gets to look at.
///
/// `matched` is the first descendant of `card` matching the rule's selector;
/// `selector` is that same compiled selector, for rules that need every match.
pub struct DeriveInput<'a> {
    pub card: ElementRef<'a>,
    pub matched: ElementRef<'a>,
    pub selector: &'a Selector,
}

type DeriveFn = dyn Fn(&DeriveInput<'_>) -> anyhow::Result<Option<String>> + Send + Sync;

/// A derived-value function with a label used in warnings.
#[derive(Clone)]
pub struct Derived {
    label: String,
    func: Arc<DeriveFn>,
}

impl Derived {
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&DeriveInput<'_>) -> anyhow::Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn call(&self, input: &DeriveInput<'_>) -> anyhow::Result<Option<String>> {
        (self.func)(input)
    }
}

impl fmt::Debug for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// How the matched node becomes a value.
#[derive(Debug, Clone)]
pub enum Extract {
    /// Trimmed, whitespace-collapsed text content.
    Text,
    /// Raw attribute value.
    Attr(String),
    /// Attribute value resolved against the source's base URL.
    Url(String),
    Derived(Derived),
}

/// One named field of a record.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub css: String,
    pub selector: Selector,
    pub extract: Extract,
    pub required: bool,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, css: &str, extract: Extract) -> anyhow::Result<Self> {
        Ok(Self {
            name: name.into(),
            css: css.to_string(),
            selector: compile_selector(css)?,
            extract,
            required: false,
        })
    }

    pub fn text(name: impl Into<String>, css: &str) -> anyhow::Result<Self> {
        Self::new(name, css, Extract::Text)
    }

    pub fn attr(name: impl Into<String>, css: &str, attr: &str) -> anyhow::Result<Self> {
        Self::new(name, css, Extract::Attr(attr.to_string()))
    }

    pub fn url(name: impl Into<String>, css: &str, attr: &str) -> anyhow::Result<Self> {
        Self::new(name, css, Extract::Url(attr.to_string()))
    }

    pub fn derived(name: impl Into<String>, css: &str, derived: Derived) -> anyhow::Result<Self> {
        Self::new(name, css, Extract::Derived(derived))
    }

    /// Marks the rule as required: a card where it resolves to nothing is skipped.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}
