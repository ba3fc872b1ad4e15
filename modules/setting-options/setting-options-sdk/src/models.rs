//! Public models for the setting-options store.
//!
//! These mirror the JSON shapes of the settings REST API and are shared by
//! the store, its transport, and its consumers.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::{ApiError, SettingsError};

/// Named collection of settings, possibly with sub-groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsGroup {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub sub_groups: Vec<String>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,
}

/// UI field kind of a setting.
///
/// Kinds unknown to this crate are kept verbatim in [`SettingType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SettingType {
    #[default]
    Text,
    Email,
    Number,
    Color,
    Password,
    Textarea,
    Title,
    Select,
    Multiselect,
    Radio,
    ImageWidth,
    Checkbox,
    Url,
    RelativeDateSelector,
    SingleSelectPage,
    SingleSelectPageWithSearch,
    SingleSelectCountry,
    MultiSelectCountries,
    SectionEnd,
    SlotfillPlaceholder,
    Other(String),
}

impl SettingType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Color => "color",
            Self::Password => "password",
            Self::Textarea => "textarea",
            Self::Title => "title",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Radio => "radio",
            Self::ImageWidth => "image_width",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::RelativeDateSelector => "relative_date_selector",
            Self::SingleSelectPage => "single_select_page",
            Self::SingleSelectPageWithSearch => "single_select_page_with_search",
            Self::SingleSelectCountry => "single_select_country",
            Self::MultiSelectCountries => "multi_select_countries",
            Self::SectionEnd => "sectionend",
            Self::SlotfillPlaceholder => "slotfill_placeholder",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for SettingType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => Self::Text,
            "email" => Self::Email,
            "number" => Self::Number,
            "color" => Self::Color,
            "password" => Self::Password,
            "textarea" => Self::Textarea,
            "title" => Self::Title,
            "select" => Self::Select,
            "multiselect" => Self::Multiselect,
            "radio" => Self::Radio,
            "image_width" => Self::ImageWidth,
            "checkbox" => Self::Checkbox,
            "url" => Self::Url,
            "relative_date_selector" => Self::RelativeDateSelector,
            "single_select_page" => Self::SingleSelectPage,
            "single_select_page_with_search" => Self::SingleSelectPageWithSearch,
            "single_select_country" => Self::SingleSelectCountry,
            "multi_select_countries" => Self::MultiSelectCountries,
            "sectionend" => Self::SectionEnd,
            "slotfill_placeholder" => Self::SlotfillPlaceholder,
            _ => Self::Other(kind),
        }
    }
}

impl From<SettingType> for String {
    fn from(kind: SettingType) -> Self {
        match kind {
            SettingType::Other(kind) => kind,
            known => known.as_str().to_owned(),
        }
    }
}

/// Value of a setting.
///
/// Serialized untagged, so the wire format is plain JSON. Anything that is not
/// a boolean, a number, a string or a list of strings is kept as [`SettingValue::Opaque`].
///
/// Numbers compare by value, so `10` and `10.0` are equal.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(Number),
    Text(String),
    List(Vec<String>),
    Opaque(Value),
}

impl SettingValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Text(text) => Value::String(text.clone()),
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
            Self::Opaque(value) => value.clone(),
        }
    }
}

impl PartialEq for SettingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => numbers_equal(a, b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(std::cmp::Ordering::Equal),
        _ => a == b,
    }
}

impl Default for SettingValue {
    fn default() -> Self {
        Self::Opaque(Value::Null)
    }
}

impl From<Value> for SettingValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::Text(text),
            Value::Array(items) if items.iter().all(Value::is_string) => Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Opaque(other),
        }
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<&str> for SettingValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for SettingValue {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for SettingValue {
    fn from(number: i64) -> Self {
        Self::Number(number.into())
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Canonical, last-known-good state of one setting as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: SettingType,
    #[serde(default)]
    pub value: SettingValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<SettingValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Setting {
    /// A bare setting with only an id and a value, mostly useful in tests and fixtures.
    pub fn new(id: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            description: String::new(),
            kind: SettingType::default(),
            value: value.into(),
            default: None,
            options: None,
            tip: None,
            placeholder: None,
        }
    }
}

/// One `{id, value}` entry of an edit or save request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingUpdate {
    pub id: String,
    pub value: SettingValue,
}

impl SettingUpdate {
    pub fn new(id: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// Updates accepted by batch edits and saves: either a list of entries or an
/// `id -> value` map. Both normalize to the list form, preserving order.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingUpdates {
    List(Vec<SettingUpdate>),
    Map(IndexMap<String, SettingValue>),
}

impl SettingUpdates {
    /// Parses loosely-typed input: an array of `{id, value}` objects or an object map.
    ///
    /// # Errors
    /// Returns [`SettingsError::Validation`] if the input has any other shape, an
    /// entry has a missing or empty `id`, or an entry has no `value`.
    pub fn from_json(input: Value) -> Result<Self, SettingsError> {
        match input {
            Value::Array(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| parse_entry(index, entry))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Object(map) => {
                let updates = Self::Map(
                    map.into_iter()
                        .map(|(id, value)| (id, SettingValue::from(value)))
                        .collect(),
                );
                updates.validate()?;
                Ok(updates)
            }
            other => Err(SettingsError::validation(format!(
                "setting updates must be an array or an object, got {other}"
            ))),
        }
    }

    /// Checks that every entry has a non-empty id.
    ///
    /// # Errors
    /// Returns [`SettingsError::Validation`] naming the first invalid entry.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = match self {
            Self::List(entries) => entries.iter().position(|entry| entry.id.is_empty()),
            Self::Map(map) => map.keys().position(String::is_empty),
        };
        match invalid {
            Some(index) => Err(SettingsError::validation(format!(
                "setting update at index {index} has an empty id"
            ))),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(entries) => entries.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<SettingUpdate> {
        match self {
            Self::List(entries) => entries,
            Self::Map(map) => map
                .into_iter()
                .map(|(id, value)| SettingUpdate { id, value })
                .collect(),
        }
    }
}

fn parse_entry(index: usize, entry: Value) -> Result<SettingUpdate, SettingsError> {
    let Value::Object(mut fields) = entry else {
        return Err(SettingsError::validation(format!(
            "setting update at index {index} is not an object"
        )));
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        _ => {
            return Err(SettingsError::validation(format!(
                "setting update at index {index} has a missing or empty id"
            )));
        }
    };
    let Some(value) = fields.remove("value") else {
        return Err(SettingsError::validation(format!(
            "setting update `{id}` has no value"
        )));
    };
    Ok(SettingUpdate {
        id,
        value: value.into(),
    })
}

impl From<Vec<SettingUpdate>> for SettingUpdates {
    fn from(entries: Vec<SettingUpdate>) -> Self {
        Self::List(entries)
    }
}

impl From<IndexMap<String, SettingValue>> for SettingUpdates {
    fn from(map: IndexMap<String, SettingValue>) -> Self {
        Self::Map(map)
    }
}

/// Read options for settings selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReadOptions {
    /// Overlay pending local edits on canonical values.
    pub include_edits: bool,
}

impl ReadOptions {
    #[must_use]
    pub fn with_edits() -> Self {
        Self {
            include_edits: true,
        }
    }
}

/// Body of `POST {namespace}/settings/{group}/batch`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub update: &'a [SettingUpdate],
}

/// Response of the batch endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub update: Vec<BatchUpdateEntry>,
}

/// One entry of a batch response: the updated setting, or the reason it was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchUpdateEntry {
    Updated(Setting),
    Failed { id: String, error: ApiError },
}

impl<'de> Deserialize<'de> for BatchUpdateEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entry = Value::deserialize(deserializer)?;
        let failed = entry.get("error").is_some_and(Value::is_object);
        if failed {
            let error = entry
                .get_mut("error")
                .map(Value::take)
                .unwrap_or_default();
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let error = serde_json::from_value(error).map_err(de::Error::custom)?;
            return Ok(Self::Failed { id, error });
        }
        serde_json::from_value(entry)
            .map(Self::Updated)
            .map_err(de::Error::custom)
    }
}
