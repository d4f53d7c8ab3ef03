//! Raw records consumed by the spine builder.
//!
//! Rows mirror the stored JSON documents. Only the fields the spine needs are
//! kept; anything else in a record is ignored on deserialization.
//!
//! # Order lists
//!
//! Editors maintain an `order` array of child ids. Stored values are not
//! trusted: [`normalize_order`] keeps integers, converts numeric strings and
//! drops everything else.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Per-record options relevant to navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RowOptions {
    /// Hide this record (and everything below it) from spine traversal.
    #[serde(rename = "excludedFromSpine")]
    pub excluded_from_spine: bool,
}

/// Project record, the root of a spine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UnitRow {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "deserialize_order")]
    pub order: Vec<i64>,
}

/// Section record. Sections nest through `root`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SectionRow {
    pub id: i64,
    /// Owning project.
    #[serde(deserialize_with = "null_as_default")]
    pub project: i64,
    /// Parent section, 0 for a top-level section.
    #[serde(deserialize_with = "null_as_default")]
    pub root: i64,
    #[serde(deserialize_with = "deserialize_order")]
    pub order: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub options: RowOptions,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: String,
}

impl SectionRow {
    /// Structural parent: the enclosing section, else the project.
    #[must_use]
    pub fn parent(&self) -> i64 {
        if self.root != 0 {
            self.root
        } else {
            self.project
        }
    }
}

/// Page record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageRow {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub project: i64,
    /// Containing section, 0 when the page hangs off the project directly.
    #[serde(deserialize_with = "null_as_default")]
    pub section: i64,
    #[serde(deserialize_with = "deserialize_order")]
    pub order: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub options: RowOptions,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub priority: i64,
    /// Comma-separated free-text tags.
    #[serde(deserialize_with = "null_as_default")]
    pub tags: String,
}

impl PageRow {
    /// Structural parent: the containing section, else the project.
    #[must_use]
    pub fn parent(&self) -> i64 {
        if self.section != 0 {
            self.section
        } else {
            self.project
        }
    }
}

/// Normalize a stored order value into a list of child ids.
///
/// Non-zero integers (and integral floats) are kept, strings holding a
/// non-zero integer are converted, every other entry is dropped. A non-array
/// value yields an empty list.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_order(value: &Value) -> Vec<i64> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .filter(|&id| id != 0)
        .collect()
}

fn deserialize_order<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_order(&value))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
