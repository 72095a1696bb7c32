use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::freshness::parse_posted_at;
use crate::rows::RowRegistry;
use crate::tags::{self, Tag};
use crate::{AppError, ScreenConfig};

const FIELD_NAME: &str = "Product Name";
const FIELD_IMAGE: &str = "Product Image";
const FIELD_CATEGORIES: &str = "Product Categories";
const FIELD_POSTED: &str = "Posted";
const CONTENT_KEY_PREFIX: &str = "content-";
const CONTENT_KEY_HEX_LEN: usize = 16;

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

// Stable row identity. Never a list position.
typed_id!(RecordKey);

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("inventory payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inventory payload has no record list")]
    MissingRecords,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct InventoryRecord {
    pub id: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
    pub categories_raw: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_categories(mut self, raw: impl Into<String>) -> Self {
        self.categories_raw = Some(raw.into());
        self
    }

    #[must_use]
    pub fn posted_at(mut self, posted_at: DateTime<Utc>) -> Self {
        self.posted_at = Some(posted_at);
        self
    }

    pub fn tags(&self) -> Vec<Tag> {
        tags::tokenize(self.categories_raw.as_deref())
    }

    pub fn tag_fingerprint(&self) -> blake3::Hash {
        tags::fingerprint(self.categories_raw.as_deref())
    }

    /// Key from the remote id, or from a hash of the visible content when
    /// the id is missing.
    pub fn key(&self) -> RecordKey {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => RecordKey::new(id),
            _ => self.content_key(),
        }
    }

    fn content_key(&self) -> RecordKey {
        let mut hasher = blake3::Hasher::new();
        for part in [
            Some(self.name.as_str()),
            self.image_url.as_deref(),
            self.categories_raw.as_deref(),
        ] {
            hasher.update(part.unwrap_or_default().as_bytes());
            hasher.update(&[0]);
        }
        if let Some(posted_at) = self.posted_at {
            hasher.update(&posted_at.timestamp_millis().to_le_bytes());
        }
        let hex = hasher.finalize().to_hex();
        RecordKey::new(format!(
            "{CONTENT_KEY_PREFIX}{}",
            &hex.as_str()[..CONTENT_KEY_HEX_LEN]
        ))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyedRecord {
    pub key: RecordKey,
    pub record: InventoryRecord,
}

/// Assigns keys in list order. A repeated key gets the lowest free `#n`
/// suffix, so no two rows share a key even when a remote id already looks
/// like a suffixed one.
pub fn key_records(records: Vec<InventoryRecord>) -> Vec<KeyedRecord> {
    let mut taken: HashSet<RecordKey> = HashSet::with_capacity(records.len());
    let mut next_suffix: HashMap<RecordKey, usize> = HashMap::new();
    records
        .into_iter()
        .map(|record| {
            let base = record.key();
            let key = if taken.contains(&base) {
                let n = next_suffix.entry(base.clone()).or_insert(2);
                loop {
                    let candidate = RecordKey::new(format!("{base}#{n}"));
                    *n += 1;
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                }
            } else {
                base
            };
            taken.insert(key.clone());
            KeyedRecord { key, record }
        })
        .collect()
}

/// Decodes an inventory payload: either `{"records": [...]}` or a bare
/// array of records, each `{"id": .., "fields": {..}}`. Field values are
/// read leniently; entries that are not objects are skipped.
#[instrument(level = "debug", skip(body), fields(len = body.len()))]
pub fn decode_inventory(body: &str) -> Result<Vec<KeyedRecord>, RecordError> {
    let payload: Value = serde_json::from_str(body)?;
    let entries = match payload {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(RecordError::MissingRecords),
        },
        _ => return Err(RecordError::MissingRecords),
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(object) => records.push(decode_record(&object)),
            other => warn!(index, kind = value_kind(&other), "skipping non-object record"),
        }
    }
    Ok(key_records(records))
}

fn decode_record(object: &Map<String, Value>) -> InventoryRecord {
    let empty = Map::new();
    let fields = match object.get("fields") {
        Some(Value::Object(fields)) => fields,
        _ => &empty,
    };

    InventoryRecord {
        id: object.get("id").and_then(text_value),
        name: fields.get(FIELD_NAME).and_then(text_value).unwrap_or_default(),
        image_url: fields.get(FIELD_IMAGE).and_then(image_value),
        categories_raw: fields.get(FIELD_CATEGORIES).and_then(text_value),
        posted_at: fields
            .get(FIELD_POSTED)
            .and_then(text_value)
            .and_then(|raw| parse_posted_at(&raw))
            .or_else(|| fields.get(FIELD_POSTED).and_then(epoch_millis_value)),
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(text_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Null | Value::Object(_) => None,
    }
}

/// A plain URL string, or the first attachment carrying a `url`.
fn image_value(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Array(attachments) => attachments.iter().find_map(image_value),
        Value::Object(attachment) => attachment
            .get("url")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

fn epoch_millis_value(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_i64()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct Model {
    pub records: Vec<KeyedRecord>,
    pub rows: RowRegistry,
    pub config: ScreenConfig,

    pub is_refreshing: bool,
    pub fetch_in_flight: bool,
    pub frame_pending: bool,

    pub active_error: Option<AppError>,
    pub view_timestamp_ms: i64,
}

impl Default for Model {
    fn default() -> Self {
        let config = ScreenConfig::default();
        Self {
            records: Vec::new(),
            rows: RowRegistry::new(config.retained_rows),
            config,
            is_refreshing: false,
            fetch_in_flight: false,
            frame_pending: false,
            active_error: None,
            view_timestamp_ms: 0,
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("records", &self.records.len())
            .field("mounted_rows", &self.rows.mounted_len())
            .field("retained_rows", &self.rows.retained_len())
            .field("is_refreshing", &self.is_refreshing)
            .field("fetch_in_flight", &self.fetch_in_flight)
            .field("frame_pending", &self.frame_pending)
            .field("active_error", &self.active_error)
            .finish_non_exhaustive()
    }
}

impl Model {
    pub fn update_timestamp(&mut self) {
        self.view_timestamp_ms = Utc::now().timestamp_millis();
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.view_timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn record(&self, key: &RecordKey) -> Option<&KeyedRecord> {
        self.records.iter().find(|entry| &entry.key == key)
    }

    /// Swaps in a fresh record list and drops row state for keys that
    /// disappeared. Rows that are still listed keep their state.
    pub fn replace_records(&mut self, records: Vec<KeyedRecord>) {
        let live: HashSet<RecordKey> = records.iter().map(|entry| entry.key.clone()).collect();
        self.rows.retain_keys(&live);
        self.records = records;
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_envelope_payload() {
        let body = r#"{
            "records": [
                {
                    "id": "rec1",
                    "fields": {
                        "Product Name": "Oat Milk",
                        "Product Image": "https://cdn.example.com/oat.png",
                        "Product Categories": "Food, Drinks",
                        "Posted": "2024-03-05"
                    }
                },
                { "id": "rec2", "fields": {} }
            ]
        }"#;

        let records = decode_inventory(body).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.key, RecordKey::new("rec1"));
        assert_eq!(first.record.name, "Oat Milk");
        assert_eq!(
            first.record.image_url.as_deref(),
            Some("https://cdn.example.com/oat.png")
        );
        assert_eq!(first.record.categories_raw.as_deref(), Some("Food, Drinks"));
        assert_eq!(
            first.record.posted_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );

        let second = &records[1].record;
        assert_eq!(second.name, "");
        assert_eq!(second.image_url, None);
        assert_eq!(second.posted_at, None);
    }

    #[test]
    fn decodes_bare_array_with_attachments_and_multiselect() {
        let body = r#"[
            {
                "fields": {
                    "Product Name": "Crisps",
                    "Product Image": [{"url": "https://cdn.example.com/a.jpg"}, {"url": "b"}],
                    "Product Categories": ["Snacks", "Salty"],
                    "Posted": "not a date"
                }
            },
            42
        ]"#;

        let records = decode_inventory(body).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0].record;
        assert_eq!(record.image_url.as_deref(), Some("https://cdn.example.com/a.jpg"));
        assert_eq!(record.categories_raw.as_deref(), Some("Snacks,Salty"));
        assert_eq!(record.posted_at, None);
        assert!(records[0].key.as_str().starts_with(CONTENT_KEY_PREFIX));
    }

    #[test]
    fn rejects_payload_without_records() {
        assert!(matches!(
            decode_inventory(r#"{"items": []}"#),
            Err(RecordError::MissingRecords)
        ));
        assert!(matches!(decode_inventory("nope"), Err(RecordError::Json(_))));
    }

    #[test]
    fn content_keys_are_stable_and_deduplicated() {
        let record = InventoryRecord::new("Tea").with_categories("Drinks");
        let keyed = key_records(vec![record.clone(), record.clone(), record]);

        assert_eq!(keyed[0].key, keyed_base(&keyed[0]));
        assert_eq!(keyed[1].key.as_str(), format!("{}#2", keyed[0].key));
        assert_eq!(keyed[2].key.as_str(), format!("{}#3", keyed[0].key));
    }

    #[test]
    fn suffixed_keys_skip_ids_already_taken() {
        let keyed = key_records(vec![
            InventoryRecord::new("Tea").with_id("a"),
            InventoryRecord::new("Tea").with_id("a"),
            InventoryRecord::new("Tea").with_id("a#2"),
            InventoryRecord::new("Tea").with_id("a"),
        ]);
        let keys: Vec<&str> = keyed.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, ["a", "a#2", "a#2#2", "a#3"]);

        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keyed.len());
    }

    #[test]
    fn explicit_suffixed_id_is_not_reused() {
        let keyed = key_records(vec![
            InventoryRecord::new("Tea").with_id("a#2"),
            InventoryRecord::new("Tea").with_id("a"),
            InventoryRecord::new("Tea").with_id("a"),
        ]);
        let keys: Vec<&str> = keyed.iter().map(|entry| entry.key.as_str()).collect();
        assert_eq!(keys, ["a#2", "a", "a#3"]);
    }

    fn keyed_base(entry: &KeyedRecord) -> RecordKey {
        entry.record.key()
    }

    #[test]
    fn blank_id_falls_back_to_content_key() {
        let record = InventoryRecord::new("Tea").with_id("   ");
        assert!(record.key().as_str().starts_with(CONTENT_KEY_PREFIX));
        assert_eq!(InventoryRecord::new("Tea").with_id("rec9").key().as_str(), "rec9");
    }

    #[test]
    fn replacing_records_drops_state_for_vanished_keys() {
        let mut model = Model::default();
        model.replace_records(key_records(vec![
            InventoryRecord::new("A").with_id("a"),
            InventoryRecord::new("B").with_id("b"),
        ]));
        let timing = model.config.timing();
        let a = RecordKey::new("a");
        let b = RecordKey::new("b");
        model.rows.mount(a.clone(), tags::fingerprint(None), timing);
        model.rows.mount(b.clone(), tags::fingerprint(None), timing);

        model.replace_records(key_records(vec![InventoryRecord::new("A").with_id("a")]));
        assert!(model.rows.get(&a).is_some());
        assert!(model.rows.get(&b).is_none());
        assert!(model.record(&b).is_none());
    }
}
