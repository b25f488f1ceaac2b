use crate::detect::strip_bom;
use cfgdiff_common::{CfgDiffError, FileKind, Result};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

/// Format-independent view of a YAML or JSON document.
///
/// Scalars keep their textual form only; the engine never interprets values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue {
    Scalar(String),
    Sequence(Vec<StructuredValue>),
    /// Keys in source order
    Mapping(Vec<(String, StructuredValue)>),
}

impl StructuredValue {
    /// Decode a buffer of the given tree format
    pub fn parse(data: &[u8], kind: FileKind, label: &str) -> Result<Self> {
        let data = strip_bom(data);
        match kind {
            FileKind::Json => serde_json::from_slice::<JsonValue>(data)
                .map(StructuredValue::from)
                .map_err(|e| CfgDiffError::parse("json", label, e)),
            FileKind::Yaml => serde_yaml::from_slice::<YamlValue>(data)
                .map(StructuredValue::from)
                .map_err(|e| CfgDiffError::parse("yaml", label, e)),
            other => Err(CfgDiffError::parse(
                other.to_string(),
                label,
                "not a tree format",
            )),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            StructuredValue::Scalar(_) => "scalar",
            StructuredValue::Sequence(_) => "sequence",
            StructuredValue::Mapping(_) => "mapping",
        }
    }

    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Mapping(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Single-line textual rendering used in report entries
    pub fn render(&self) -> String {
        match self {
            StructuredValue::Scalar(text) => text.clone(),
            StructuredValue::Sequence(items) => {
                let items: Vec<String> = items.iter().map(StructuredValue::render).collect();
                format!("[{}]", items.join(", "))
            }
            StructuredValue::Mapping(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.render()))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }
        }
    }
}

impl From<JsonValue> for StructuredValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => StructuredValue::Scalar(String::from("null")),
            JsonValue::Bool(b) => StructuredValue::Scalar(b.to_string()),
            JsonValue::Number(n) => StructuredValue::Scalar(n.to_string()),
            JsonValue::String(s) => StructuredValue::Scalar(s),
            JsonValue::Array(items) => {
                StructuredValue::Sequence(items.into_iter().map(StructuredValue::from).collect())
            }
            JsonValue::Object(map) => StructuredValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, StructuredValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<YamlValue> for StructuredValue {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => StructuredValue::Scalar(String::from("null")),
            YamlValue::Bool(b) => StructuredValue::Scalar(b.to_string()),
            YamlValue::Number(n) => StructuredValue::Scalar(n.to_string()),
            YamlValue::String(s) => StructuredValue::Scalar(s),
            YamlValue::Sequence(items) => {
                StructuredValue::Sequence(items.into_iter().map(StructuredValue::from).collect())
            }
            YamlValue::Mapping(map) => StructuredValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (StructuredValue::from(k).render(), StructuredValue::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => StructuredValue::from(tagged.value),
        }
    }
}
