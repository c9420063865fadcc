// ABOUTME: Main library entry point for tender-harvest, a listing-page extractor for tender notices.
// ABOUTME: Re-exports the public API: pipeline, adapters, rules, records, sources, Harvester and sinks.

//! tender-harvest - extract tender/opportunity records from listing pages.
//!
//! The core is synchronous and side-effect free: [`run`] takes raw HTML and a
//! [`SourceAdapter`] and returns an [`ExtractionResult`]. Fetching pages,
//! fanning out across sources and printing results sit around that core in
//! [`Harvester`], [`fetch`] and [`render`].
//!
//! # Example
//!
//! ```
//! use tender_harvest::{run, SourceAdapter, derive};
//!
//! let adapter = SourceAdapter::builder("care", "https://www.carebangladesh.org/consultancy")
//!     .container("div#project1.tab-pane.show.active")
//!     .cards("div.col-md-3")
//!     .text("deadline", "p i")
//!     .derived("title", "p", derive::nth_text(1))
//!     .required()
//!     .url("download_url", "a.default-btn", "href")
//!     .build()?;
//!
//! let html = r#"<div id="project1" class="tab-pane show active">
//!   <div class="col-md-3"><p><i>30 June 2025</i></p><p>Endline Evaluation</p>
//!   <a class="default-btn" href="/files/tor.pdf">Download</a></div>
//! </div>"#;
//!
//! let result = run(html, &adapter)?;
//! assert_eq!(result.records[0].get("title"), Some("Endline Evaluation"));
//! assert_eq!(
//!     result.records[0].get("download_url"),
//!     Some("https://www.carebangladesh.org/files/tor.pdf")
//! );
//! # Ok::<(), tender_harvest::HarvestError>(())
//! ```

pub mod adapter;
pub mod client;
pub mod derive;
pub mod error;
pub mod fetch;
pub mod field;
pub mod options;
pub mod pipeline;
pub mod record;
pub mod relevance;
pub mod render;
pub mod rules;
pub mod sources;
pub mod url_resolver;

pub use crate::adapter::{AdapterSpec, ExtractSpec, FieldSpec, SourceAdapter, SourceAdapterBuilder};
pub use crate::client::{Harvester, SourceOutcome};
pub use crate::error::{ErrorCode, HarvestError, MissingRequiredField};
pub use crate::field::{extract_field, FieldContext};
pub use crate::options::{HarvesterBuilder, Options, DEFAULT_USER_AGENT};
pub use crate::pipeline::{extract_document, parse_document, run, ExtractionResult};
pub use crate::record::{build_record, Record};
pub use crate::relevance::{classify_document, DocumentType, Relevance, RelevanceFilter};
pub use crate::rules::{DeriveInput, Derived, Extract, FieldRule};
pub use crate::sources::{load_builtin_sources, load_sources_file, parse_sources_json, SourceRegistry};
pub use crate::url_resolver::{resolve, try_resolve, ResolveError};
