// ABOUTME: Relevance annotation for extracted tenders: keyword hits, country mention, document type.
// ABOUTME: Works on any Record by scanning its present values; never changes the extraction result.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::pipeline::ExtractionResult;
use crate::record::Record;

/// Evaluation and study terms consultancy notices are screened for.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Baseline",
    "Mid-term",
    "Midline",
    "Endline",
    "Final Evaluation",
    "Impact Evaluation",
    "Studies",
    "Assessment",
    "Research",
    "Study",
    "Monitoring",
    "Consultancy firm",
];

pub const DEFAULT_COUNTRY: &str = "Bangladesh";

static TOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(terms of reference|tor)\b").unwrap());
static RFP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(request for proposals?|rfp)\b").unwrap());
static EOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(expressions? of interest|eoi)\b").unwrap());
static RFQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(request for quotations?|rfq)\b").unwrap());

/// Procurement document kind named in a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentType {
    #[serde(rename = "ToR")]
    Tor,
    #[serde(rename = "RFP")]
    Rfp,
    #[serde(rename = "EOI")]
    Eoi,
    #[serde(rename = "RFQ")]
    Rfq,
    Other,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentType::Tor => "ToR",
            DocumentType::Rfp => "RFP",
            DocumentType::Eoi => "EOI",
            DocumentType::Rfq => "RFQ",
            DocumentType::Other => "Other",
        };
        write!(f, "{}", s)
    }
}

/// Classifies `text`; the first kind found in ToR, RFP, EOI, RFQ order wins.
pub fn classify_document(text: &str) -> DocumentType {
    if TOR_RE.is_match(text) {
        DocumentType::Tor
    } else if RFP_RE.is_match(text) {
        DocumentType::Rfp
    } else if EOI_RE.is_match(text) {
        DocumentType::Eoi
    } else if RFQ_RE.is_match(text) {
        DocumentType::Rfq
    } else {
        DocumentType::Other
    }
}

/// Outcome of screening one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relevance {
    pub matched_keywords: Vec<String>,
    pub mentions_country: bool,
    pub document_type: DocumentType,
}

/// Keyword and country screen. Matching is case-insensitive on word boundaries.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<(String, Regex)>,
    country: Option<(String, Regex)>,
}

fn word_regex(term: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term.trim())))
}

impl RelevanceFilter {
    /// `country: None` disables the country requirement.
    pub fn new<S: AsRef<str>>(keywords: &[S], country: Option<&str>) -> Result<Self, regex::Error> {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref())
            .filter(|k| !k.trim().is_empty())
            .map(|k| Ok((k.to_string(), word_regex(k)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        let country = match country {
            Some(c) if !c.trim().is_empty() => Some((c.to_string(), word_regex(c)?)),
            _ => None,
        };
        Ok(Self { keywords, country })
    }

    pub fn assess(&self, record: &Record) -> Relevance {
        let text = record.values().collect::<Vec<_>>().join(" ");
        let matched_keywords = self
            .keywords
            .iter()
            .filter(|(_, re)| re.is_match(&text))
            .map(|(k, _)| k.clone())
            .collect();
        let mentions_country = self
            .country
            .as_ref()
            .map(|(_, re)| re.is_match(&text))
            .unwrap_or(true);
        Relevance {
            matched_keywords,
            mentions_country,
            document_type: classify_document(&text),
        }
    }

    /// At least one keyword, and the country if one is configured.
    pub fn is_relevant(&self, relevance: &Relevance) -> bool {
        !relevance.matched_keywords.is_empty() && relevance.mentions_country
    }

    /// A copy of `result` keeping only relevant records, each annotated with
    /// `document_type` and `keywords` fields. `card_count` and warnings are kept.
    pub fn filter(&self, result: &ExtractionResult) -> ExtractionResult {
        let records = result
            .records
            .iter()
            .filter_map(|record| {
                let relevance = self.assess(record);
                if !self.is_relevant(&relevance) {
                    return None;
                }
                Some(
                    record
                        .clone()
                        .with_field("document_type", Some(relevance.document_type.to_string()))
                        .with_field("keywords", Some(relevance.matched_keywords.join(", "))),
                )
            })
            .collect();
        ExtractionResult {
            source_name: result.source_name.clone(),
            records,
            card_count: result.card_count,
            warnings: result.warnings.clone(),
        }
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS
                .iter()
                .map(|k| (k.to_string(), word_regex(k).unwrap()))
                .collect(),
            country: Some((DEFAULT_COUNTRY.to_string(), word_regex(DEFAULT_COUNTRY).unwrap())),
        }
    }
}
