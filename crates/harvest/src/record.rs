// ABOUTME: The canonical Record type and the RecordExtractor that builds one per card.
// ABOUTME: Field order follows rule order for output; equality compares field values only.

use std::collections::BTreeMap;

use scraper::ElementRef;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::MissingRequiredField;
use crate::field::{extract_field, FieldContext};
use crate::rules::FieldRule;

/// One extracted listing entry: field name to value-or-absent, in rule order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this record with `name` set to `value`, appended if new.
    pub fn with_field(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.set(name.into(), value);
        self
    }

    fn set(&mut self, name: String, value: Option<String>) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// The value of `name`, or `None` if absent or not a field of this record.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    /// Present values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every field is absent.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_none())
    }

    fn as_map(&self) -> BTreeMap<&str, Option<&str>> {
        self.fields().collect()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.as_map() == other.as_map()
    }
}

impl Eq for Record {}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name.into(), value);
        }
        record
    }
}

/// Applies `fields` in order to `card`.
///
/// A required rule that resolves to `None` aborts the card with
/// `MissingRequiredField`; the caller decides what to do with that.
pub fn build_record(
    card: ElementRef<'_>,
    fields: &[FieldRule],
    ctx: &mut FieldContext<'_>,
) -> Result<Record, MissingRequiredField> {
    let mut record = Record::new();
    for rule in fields {
        let value = extract_field(card, rule, ctx);
        if rule.required && value.is_none() {
            return Err(MissingRequiredField {
                card_index: ctx.card_index,
                field: rule.name.clone(),
            });
        }
        record.set(rule.name.clone(), value);
    }
    Ok(record)
}
