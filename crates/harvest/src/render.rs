// ABOUTME: Output sinks for extraction results: an aligned console listing and JSON.
// ABOUTME: Absent values render as "None" in text and null in JSON; the core never picks a form.

use serde_json::json;

use crate::client::SourceOutcome;
use crate::pipeline::ExtractionResult;

/// Text printed for an absent value.
pub const ABSENT: &str = "None";

/// "download_url" -> "Download url".
fn label(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Console listing: one dashed block per record, labels aligned, then a total.
pub fn render_text(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("== {} ==\n", result.source_name));

    for record in &result.records {
        let width = record
            .fields()
            .map(|(name, _)| label(name).chars().count())
            .max()
            .unwrap_or(0);
        out.push_str(&"-".repeat(60));
        out.push('\n');
        for (name, value) in record.fields() {
            out.push_str(&format!(
                "{:<width$} : {}\n",
                label(name),
                value.unwrap_or(ABSENT),
                width = width
            ));
        }
    }

    out.push_str(&format!(
        "\nTotal tenders found: {} (cards: {})\n",
        result.records.len(),
        result.card_count
    ));
    for warning in &result.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

/// JSON for a batch: successful sources carry their result, failed ones their error.
pub fn outcomes_json(outcomes: &[SourceOutcome]) -> serde_json::Value {
    let sources: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(result) => json!({
                "key": o.key,
                "ok": true,
                "result": result,
                "error": null,
            }),
            Err(e) => json!({
                "key": o.key,
                "ok": false,
                "result": null,
                "error": e.to_string(),
            }),
        })
        .collect();
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let total_records: usize = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|r| r.records.len())
        .sum();
    json!({
        "sources": sources,
        "total_sources": outcomes.len(),
        "failed": failed,
        "total_records": total_records,
    })
}
