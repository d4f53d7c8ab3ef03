//! Persisted form of a spine.
//!
//! ```json
//! {
//!   "unit": 1,
//!   "nodes": [
//!     {"id": 1, "root": 0, "next": 0, "prev": 0, "depth": 0, "type": "unit",
//!      "ex": false, "uord": [10, 11], "title": "Codex"}
//!   ],
//!   "tags": [["intro", 1], ["setup", 2]]
//! }
//! ```
//!
//! `ord`, `uord`, `title`, `name` and `priority` are omitted when empty.
//! Decoding is lenient: malformed records and entries are dropped and
//! mistyped fields fall back to their defaults rather than failing the whole
//! spine.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::node::{Node, NodeKind, NodePayload, NodeStore};
use crate::tags::TagIndex;

/// Stored spine container.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct EncodedSpine {
    #[serde(deserialize_with = "lenient")]
    unit: i64,
    #[serde(deserialize_with = "deserialize_nodes")]
    nodes: Vec<EncodedNode>,
    #[serde(deserialize_with = "deserialize_tags")]
    tags: Vec<(String, usize)>,
}

/// Stored node record.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct EncodedNode {
    #[serde(deserialize_with = "lenient")]
    id: i64,
    #[serde(deserialize_with = "lenient")]
    root: i64,
    #[serde(deserialize_with = "lenient")]
    next: i64,
    #[serde(deserialize_with = "lenient")]
    prev: i64,
    #[serde(deserialize_with = "lenient")]
    depth: usize,
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: NodeKind,
    #[serde(deserialize_with = "lenient")]
    ex: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "id_list")]
    ord: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "id_list")]
    uord: Vec<i64>,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "lenient")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "lenient")]
    name: String,
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "lenient")]
    priority: i64,
}

impl From<&Node> for EncodedNode {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            root: node.parent,
            next: node.next,
            prev: node.prev,
            depth: node.depth,
            kind: node.kind,
            ex: node.excluded,
            ord: node.ordered.clone(),
            uord: node.unordered.clone(),
            title: node.payload.title.clone(),
            name: node.payload.name.clone(),
            priority: node.payload.priority,
        }
    }
}

impl From<EncodedNode> for Node {
    fn from(encoded: EncodedNode) -> Self {
        Self {
            id: encoded.id,
            parent: encoded.root,
            kind: encoded.kind,
            ordered: encoded.ord,
            unordered: encoded.uord,
            excluded: encoded.ex,
            depth: encoded.depth,
            prev: encoded.prev,
            next: encoded.next,
            payload: NodePayload {
                title: encoded.title,
                name: encoded.name,
                priority: encoded.priority,
            },
        }
    }
}

/// Encode nodes and tags into the persisted container.
pub fn encode(
    unit: i64,
    store: &NodeStore,
    tags: &TagIndex,
) -> Result<Value, serde_json::Error> {
    serde_json::to_value(EncodedSpine {
        unit,
        nodes: store.iter().map(EncodedNode::from).collect(),
        tags: tags.entries().to_vec(),
    })
}

/// Encode a single node record.
pub fn encode_node(node: &Node) -> Result<Value, serde_json::Error> {
    serde_json::to_value(EncodedNode::from(node))
}

/// Decoded container contents.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub unit: i64,
    pub store: NodeStore,
    pub tags: TagIndex,
}

/// Decode a persisted container.
///
/// Returns `None` when `value` is not an object. Missing or malformed
/// `nodes`/`tags` decode as empty.
#[must_use]
pub fn decode(value: &Value) -> Option<Decoded> {
    if !value.is_object() {
        return None;
    }
    let encoded = EncodedSpine::deserialize(value).ok()?;

    Some(Decoded {
        unit: encoded.unit,
        store: NodeStore::from_nodes(encoded.nodes.into_iter().map(Node::from).collect()),
        tags: TagIndex::from_entries(encoded.tags),
    })
}

/// Decode a single node record. Returns `None` for non-objects.
#[must_use]
pub fn decode_node(value: &Value) -> Option<Node> {
    if !value.is_object() {
        return None;
    }
    EncodedNode::deserialize(value).ok().map(Node::from)
}

/// Any value of the wrong shape decodes as the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Integer entries of an id list; anything else is dropped.
fn id_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<Value> = lenient(deserializer)?;
    Ok(entries.iter().filter_map(Value::as_i64).collect())
}

fn deserialize_nodes<'de, D>(deserializer: D) -> Result<Vec<EncodedNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let records: Vec<Value> = lenient(deserializer)?;
    let nodes: Vec<EncodedNode> = records
        .iter()
        .filter(|record| record.is_object())
        .filter_map(|record| EncodedNode::deserialize(record).ok())
        .collect();

    let skipped = records.len() - nodes.len();
    if skipped > 0 {
        tracing::warn!(skipped, "Skipped malformed spine node records");
    }
    Ok(nodes)
}

/// `[tag, count]` pairs; entries of any other shape are dropped.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<(String, usize)>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<Value> = lenient(deserializer)?;
    Ok(entries
        .iter()
        .filter_map(|entry| <(String, usize)>::deserialize(entry).ok())
        .collect())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i64) -> bool {
    *value == 0
}
