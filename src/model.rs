//! Practice items and practice logs
//!
//! Both are stored as plain JSON objects (`camelCase` keys), one array per
//! collection. An item's `kind` and `values` travel together as [`ItemValues`],
//! a tagged union with one typed field set per kind.

use crate::error::{Error, Result};
use crate::kinds::{FieldDefault, FieldType, Kind};
use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Length of item previews before truncation
pub const PREVIEW_MAX_LEN: usize = 40;

lazy_static! {
    // Absolute http(s) links or relative paths like ./bass-notes.html
    static ref URL_RE: Regex = Regex::new(r"^(https?://[^\s/$.?#][^\s]*|\.{0,2}/[^\s]*)$").unwrap();
}

/// Whether `raw` may be rendered as a link target
pub fn is_link(raw: &str) -> bool {
    URL_RE.is_match(raw)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a timestamp the way it is persisted: UTC, milliseconds, `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Timestamp(format!("{}: {}", s, e)))
}

/// Serde adapter keeping stored timestamps in the fixed-width ISO form
pub mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Per-kind field sets
// ============================================================================

fn default_target_bpm() -> u32 {
    100
}

fn default_duration() -> u32 {
    60
}

fn default_stamina_bpm() -> u32 {
    120
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiffValues {
    #[serde(default = "default_target_bpm")]
    pub target_bpm: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BassbuzzValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<u32>,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseValues {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub focus: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupValues {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoryValues {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceValues {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaminaValues {
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_stamina_bpm")]
    pub bpm: u32,
    #[serde(default)]
    pub description: String,
}

/// An item's kind together with its typed values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValues {
    Riff(RiffValues),
    Bassbuzz(BassbuzzValues),
    Exercise(ExerciseValues),
    Warmup(WarmupValues),
    Theory(TheoryValues),
    Resource(ResourceValues),
    Stamina(StaminaValues),
}

/// A labelled value shown in the item detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailField {
    pub label: &'static str,
    pub value: DetailValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DetailValue {
    Text(String),
    /// Tab or notes, shown monospaced
    Notes(String),
    Link(String),
}

fn truncate_preview(s: &str) -> String {
    if s.chars().count() > PREVIEW_MAX_LEN {
        let cut: String = s.chars().take(PREVIEW_MAX_LEN).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn opt_number(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string())
}

impl ItemValues {
    pub fn kind(&self) -> Kind {
        match self {
            ItemValues::Riff(_) => Kind::Riff,
            ItemValues::Bassbuzz(_) => Kind::Bassbuzz,
            ItemValues::Exercise(_) => Kind::Exercise,
            ItemValues::Warmup(_) => Kind::Warmup,
            ItemValues::Theory(_) => Kind::Theory,
            ItemValues::Resource(_) => Kind::Resource,
            ItemValues::Stamina(_) => Kind::Stamina,
        }
    }

    /// Schema defaults for a kind (required fields without default stay empty)
    pub fn defaults(kind: Kind) -> Self {
        match kind {
            Kind::Riff => ItemValues::Riff(RiffValues {
                target_bpm: default_target_bpm(),
                notes: String::new(),
            }),
            Kind::Bassbuzz => ItemValues::Bassbuzz(BassbuzzValues::default()),
            Kind::Exercise => ItemValues::Exercise(ExerciseValues::default()),
            Kind::Warmup => ItemValues::Warmup(WarmupValues::default()),
            Kind::Theory => ItemValues::Theory(TheoryValues::default()),
            Kind::Resource => ItemValues::Resource(ResourceValues::default()),
            Kind::Stamina => ItemValues::Stamina(StaminaValues {
                duration: default_duration(),
                bpm: default_stamina_bpm(),
                description: String::new(),
            }),
        }
    }

    /// Decode stored `values` for a kind. Unknown fields are ignored and
    /// missing ones take the schema default.
    pub fn from_json(kind: Kind, values: Value) -> serde_json::Result<Self> {
        let values = if values.is_null() {
            Value::Object(Map::new())
        } else {
            values
        };
        Ok(match kind {
            Kind::Riff => ItemValues::Riff(serde_json::from_value(values)?),
            Kind::Bassbuzz => ItemValues::Bassbuzz(serde_json::from_value(values)?),
            Kind::Exercise => ItemValues::Exercise(serde_json::from_value(values)?),
            Kind::Warmup => ItemValues::Warmup(serde_json::from_value(values)?),
            Kind::Theory => ItemValues::Theory(serde_json::from_value(values)?),
            Kind::Resource => ItemValues::Resource(serde_json::from_value(values)?),
            Kind::Stamina => ItemValues::Stamina(serde_json::from_value(values)?),
        })
    }

    pub fn to_json(&self) -> Value {
        let encoded = match self {
            ItemValues::Riff(v) => serde_json::to_value(v),
            ItemValues::Bassbuzz(v) => serde_json::to_value(v),
            ItemValues::Exercise(v) => serde_json::to_value(v),
            ItemValues::Warmup(v) => serde_json::to_value(v),
            ItemValues::Theory(v) => serde_json::to_value(v),
            ItemValues::Resource(v) => serde_json::to_value(v),
            ItemValues::Stamina(v) => serde_json::to_value(v),
        };
        // Plain structs of strings and integers always encode
        encoded.unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Build values from raw form input, driven by the kind's field schema
    pub fn from_form(kind: Kind, fields: &BTreeMap<String, String>) -> Result<Self> {
        let definition = kind.definition();
        let mut values = Map::new();

        for field in definition.fields {
            let raw = fields.get(field.name).map(|s| s.trim()).unwrap_or("");

            if raw.is_empty() {
                if field.required && !matches!(field.default, Some(FieldDefault::Number(_))) {
                    return Err(Error::Validation(format!("{} is required", field.label)));
                }
                match field.default {
                    Some(FieldDefault::Number(n)) => {
                        values.insert(field.name.to_string(), Value::from(n));
                    }
                    Some(FieldDefault::Text(s)) => {
                        values.insert(field.name.to_string(), Value::from(s));
                    }
                    None => {}
                }
                continue;
            }

            match field.field_type {
                FieldType::Number => {
                    let n: u32 = raw.parse().map_err(|_| {
                        Error::Validation(format!("{} must be a whole number, got '{}'", field.label, raw))
                    })?;
                    if field.min.map(|min| n < min).unwrap_or(false)
                        || field.max.map(|max| n > max).unwrap_or(false)
                    {
                        return Err(Error::Validation(format!(
                            "{} must be between {} and {}",
                            field.label,
                            field.min.unwrap_or(0),
                            field.max.unwrap_or(u32::MAX)
                        )));
                    }
                    values.insert(field.name.to_string(), Value::from(n));
                }
                FieldType::Url => {
                    if !is_link(raw) {
                        return Err(Error::Validation(format!("{} is not a valid link: '{}'", field.label, raw)));
                    }
                    values.insert(field.name.to_string(), Value::from(raw));
                }
                FieldType::Text => {
                    values.insert(field.name.to_string(), Value::from(raw));
                }
            }
        }

        Ok(Self::from_json(kind, Value::Object(values))?)
    }

    /// One-line summary shown under the item title in lists
    pub fn preview(&self) -> Option<String> {
        match self {
            ItemValues::Riff(v) => non_empty(&v.notes)
                .map(truncate_preview)
                .or_else(|| (v.target_bpm > 0).then(|| format!("Target: {} BPM", v.target_bpm))),
            ItemValues::Stamina(v) => Some(format!("{}s @ {} BPM", v.duration, v.bpm)),
            ItemValues::Bassbuzz(v) => Some(format!("M{} L{}", opt_number(v.module), opt_number(v.lesson))),
            ItemValues::Resource(v) => non_empty(&v.description).map(truncate_preview),
            ItemValues::Exercise(v) => non_empty(&v.focus).map(truncate_preview),
            ItemValues::Warmup(_) | ItemValues::Theory(_) => None,
        }
    }

    /// Fields shown in the item detail view, in display order
    pub fn detail_fields(&self) -> Vec<DetailField> {
        let mut fields = Vec::new();

        match self {
            ItemValues::Riff(v) => {
                if v.target_bpm > 0 {
                    push_text(&mut fields, "Target BPM", &v.target_bpm.to_string());
                }
                if !v.notes.is_empty() {
                    fields.push(DetailField {
                        label: "Notes/Tab",
                        value: DetailValue::Notes(v.notes.clone()),
                    });
                }
            }
            ItemValues::Stamina(v) => {
                if v.duration > 0 {
                    push_text(&mut fields, "Duration", &format!("{} seconds", v.duration));
                }
                if v.bpm > 0 {
                    push_text(&mut fields, "BPM", &v.bpm.to_string());
                }
                push_text(&mut fields, "Description", &v.description);
            }
            ItemValues::Bassbuzz(v) => {
                if let Some(module) = v.module {
                    push_text(&mut fields, "Module", &module.to_string());
                }
                if let Some(lesson) = v.lesson {
                    push_text(&mut fields, "Lesson", &lesson.to_string());
                }
            }
            ItemValues::Resource(v) => {
                push_link(&mut fields, &v.link);
                push_text(&mut fields, "Description", &v.description);
            }
            ItemValues::Exercise(v) => {
                push_text(&mut fields, "Focus", &v.focus);
                push_link(&mut fields, &v.link);
            }
            ItemValues::Warmup(v) => {
                push_text(&mut fields, "Description", &v.description);
            }
            ItemValues::Theory(v) => {
                push_text(&mut fields, "Topic", &v.topic);
                push_link(&mut fields, &v.link);
            }
        }

        fields
    }

    /// Current value of a schema field, as the item form shows it
    pub fn form_value(&self, name: &str) -> Option<String> {
        match self.to_json().get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn push_text(fields: &mut Vec<DetailField>, label: &'static str, value: &str) {
    if !value.is_empty() {
        fields.push(DetailField {
            label,
            value: DetailValue::Text(value.to_string()),
        });
    }
}

/// Links that fail [`is_link`] are shown as plain text
fn push_link(fields: &mut Vec<DetailField>, link: &str) {
    if link.is_empty() {
        return;
    }
    let value = if is_link(link) {
        DetailValue::Link(link.to_string())
    } else {
        DetailValue::Text(link.to_string())
    };
    fields.push(DetailField { label: "Link", value });
}

// ============================================================================
// Practice item
// ============================================================================

/// A trackable practice unit (riff, exercise, lesson, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawItem", into = "RawItem")]
pub struct PracticeItem {
    pub id: String,
    pub title: String,
    pub values: ItemValues,
    pub pinned: bool,
    pub allow_burst: bool,
    /// Lesson completed; only meaningful for BassBuzz items
    pub completed: bool,
}

impl PracticeItem {
    pub fn new(title: &str, values: ItemValues) -> Self {
        Self {
            id: new_id(),
            title: title.trim().to_string(),
            values,
            pinned: false,
            allow_burst: false,
            completed: false,
        }
    }

    pub fn kind(&self) -> Kind {
        self.values.kind()
    }

    pub fn kind_label(&self) -> &'static str {
        self.kind().label()
    }

    pub fn preview(&self) -> Option<String> {
        self.values.preview()
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn with_allow_burst(mut self, allow_burst: bool) -> Self {
        self.allow_burst = allow_burst;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

/// Stored shape of a practice item
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    id: String,
    title: String,
    kind: String,
    #[serde(default)]
    values: Value,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    allow_burst: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
}

impl TryFrom<RawItem> for PracticeItem {
    type Error = String;

    fn try_from(raw: RawItem) -> std::result::Result<Self, Self::Error> {
        let kind: Kind = raw.kind.parse()?;
        let values = ItemValues::from_json(kind, raw.values)
            .map_err(|e| format!("Invalid values for {} item {}: {}", kind, raw.id, e))?;
        Ok(Self {
            id: raw.id,
            title: raw.title,
            values,
            pinned: raw.pinned,
            allow_burst: raw.allow_burst,
            completed: raw.completed.unwrap_or(false),
        })
    }
}

impl From<PracticeItem> for RawItem {
    fn from(item: PracticeItem) -> Self {
        let kind = item.kind();
        Self {
            id: item.id,
            title: item.title,
            kind: kind.as_str().to_string(),
            values: item.values.to_json(),
            pinned: item.pinned,
            allow_burst: item.allow_burst,
            completed: (kind == Kind::Bassbuzz || item.completed).then_some(item.completed),
        }
    }
}

// ============================================================================
// Practice log
// ============================================================================

pub const MODE_BURST: &str = "burst";

/// BassBuzz workout flavours offered next to each lesson
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workout {
    Lesson,
    Slow,
    Middle,
    Fast,
}

pub const ALL_WORKOUTS: [Workout; 4] = [Workout::Lesson, Workout::Slow, Workout::Middle, Workout::Fast];

impl Workout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workout::Lesson => "lesson",
            Workout::Slow => "slow",
            Workout::Middle => "middle",
            Workout::Fast => "fast",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Workout::Lesson => "Lesson",
            Workout::Slow => "Slow workout",
            Workout::Middle => "Middle workout",
            Workout::Fast => "Fast workout",
        }
    }

    pub fn mode(&self) -> String {
        format!("bassbuzz-{}", self.as_str())
    }
}

impl std::str::FromStr for Workout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_WORKOUTS
            .iter()
            .find(|w| w.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown workout '{}' (expected lesson, slow, middle or fast)", s))
    }
}

/// Mode-specific runtime data recorded with a log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<Workout>,
}

/// One completed practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeLog {
    pub id: String,
    #[serde(with = "iso_millis")]
    pub date_time: DateTime<Utc>,
    pub item_id: String,
    pub mode: String,
    pub minutes: u32,
    #[serde(default)]
    pub values: LogValues,
    pub notes_awarded: u32,
}

impl PracticeLog {
    pub fn new(item: &PracticeItem, date_time: DateTime<Utc>, mode: &str, minutes: u32) -> Self {
        Self {
            id: new_id(),
            // Stored with millisecond precision; truncate now so values compare equal after a reload
            date_time: parse_timestamp(&format_timestamp(&date_time)).unwrap_or(date_time),
            item_id: item.id.clone(),
            mode: mode.to_string(),
            minutes,
            values: LogValues::default(),
            notes_awarded: item.kind().default_reward(),
        }
    }
}

// ============================================================================
// Log filters
// ============================================================================

/// Filters for listing logs. Every provided filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    /// Inclusive lower bound
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Only logs whose item has this kind
    #[serde(default)]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub item_id: Option<String>,
}

impl LogFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn for_kind(kind: Kind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn for_item(item_id: &str) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            ..Self::default()
        }
    }

    /// Time and item checks. The kind check needs the item collection and is
    /// applied by the store.
    pub fn matches(&self, log: &PracticeLog) -> bool {
        self.from.map(|from| log.date_time >= from).unwrap_or(true)
            && self.to.map(|to| log.date_time <= to).unwrap_or(true)
            && self.item_id.as_ref().map(|id| &log.item_id == id).unwrap_or(true)
    }
}

/// Most recent first
pub fn sort_logs_desc(logs: &mut [PracticeLog]) {
    logs.sort_by(|a, b| b.date_time.cmp(&a.date_time));
}
