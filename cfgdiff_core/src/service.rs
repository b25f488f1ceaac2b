//! Service configuration extraction.
//!
//! A service's expected configuration arrives in some source format (a flat
//! key/value dump, an INI fragment, INI text embedded in a YAML manifest). An extractor turns it into an
//! [`IniDocument`] shaped like the live service file, which is then compared
//! with the INI comparator. Extractors are looked up by name, so adding a
//! service format means registering another [`ConfigExtractor`].

use crate::ini::IniDocument;
use crate::ini_diff::compare_ini_documents;
use crate::options::CompareOptions;
use crate::structured::StructuredValue;
use cfgdiff_common::{CfgDiffError, ComparisonReport, FileKind, Result, ServiceConfigMapping};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub trait ConfigExtractor: Send + Sync {
    /// Registry key, referenced by `ServiceConfigMapping::extractor`
    fn name(&self) -> &str;

    fn extract(&self, raw: &[u8], mapping: &ServiceConfigMapping) -> Result<IniDocument>;
}

/// Flat `key=value` or `key: value` lines placed into one section
#[derive(Debug, Default)]
pub struct KeyValueExtractor;

impl ConfigExtractor for KeyValueExtractor {
    fn name(&self) -> &str {
        "key-value"
    }

    fn extract(&self, raw: &[u8], mapping: &ServiceConfigMapping) -> Result<IniDocument> {
        let mut doc = IniDocument::new();
        for (key, value) in parse_key_values(raw) {
            doc.set(&mapping.section, mapping.mapped_key(&key), &value);
        }
        Ok(doc)
    }
}

/// INI fragment whose keys are renamed through the mapping
#[derive(Debug, Default)]
pub struct IniExtractor;

impl ConfigExtractor for IniExtractor {
    fn name(&self) -> &str {
        "ini"
    }

    fn extract(&self, raw: &[u8], mapping: &ServiceConfigMapping) -> Result<IniDocument> {
        let source = IniDocument::parse(raw, "service configuration")?;
        let mut doc = IniDocument::new();
        for section in source.sections() {
            for (key, value) in source.section_entries(&section.name) {
                doc.set(&section.name, mapping.mapped_key(key), value);
            }
        }
        Ok(doc)
    }
}

/// INI text stored as a string at `source_path` inside a YAML document.
///
/// Only `[section]` headers and `key=value` lines are kept; keys outside
/// any section are dropped. A value that does not start with a section
/// header yields an empty document.
#[derive(Debug, Default)]
pub struct EmbeddedIniExtractor;

impl ConfigExtractor for EmbeddedIniExtractor {
    fn name(&self) -> &str {
        "yaml-ini"
    }

    fn extract(&self, raw: &[u8], mapping: &ServiceConfigMapping) -> Result<IniDocument> {
        let path = mapping.source_path.as_deref().ok_or_else(|| {
            CfgDiffError::Config("the yaml-ini extractor needs a source_path".to_string())
        })?;
        let document = StructuredValue::parse(raw, FileKind::Yaml, "service manifest")?;
        let embedded = match lookup_path(&document, path) {
            Some(StructuredValue::Scalar(text)) => text.as_str(),
            Some(other) => {
                return Err(CfgDiffError::Config(format!(
                    "'{}' holds a {}, expected an INI string",
                    path,
                    other.kind_name()
                )))
            }
            None => {
                return Err(CfgDiffError::Config(format!(
                    "'{}' not found in service manifest",
                    path
                )))
            }
        };

        let mut doc = IniDocument::new();
        if !embedded.trim_start().starts_with('[') {
            warn!("'{}' does not start with a section header, nothing to compare", path);
            return Ok(doc);
        }
        let cleaned = clean_ini_sections(embedded);
        let source = IniDocument::parse(cleaned.as_bytes(), path)?;
        for section in source.sections() {
            for (key, value) in source.section_entries(&section.name) {
                doc.set(&section.name, mapping.mapped_key(key), value);
            }
        }
        Ok(doc)
    }
}

/// Follow a dotted path; numeric segments index into sequences
fn lookup_path<'a>(value: &'a StructuredValue, path: &str) -> Option<&'a StructuredValue> {
    path.split('.').try_fold(value, |current, segment| match current {
        StructuredValue::Mapping(_) => current.get(segment),
        StructuredValue::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        StructuredValue::Scalar(_) => None,
    })
}

/// Keep section headers and `key=value` lines that belong to a section
fn clean_ini_sections(text: &str) -> String {
    let mut out = String::new();
    let mut in_section = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') && line.ends_with(']') {
            in_section = true;
            out.push_str(line);
            out.push('\n');
        } else if in_section && line.contains('=') && !line.starts_with('#') && !line.starts_with(';') {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Parse flat key/value lines.
///
/// `=` is tried before `:`; comment, blank and delimiter-less lines are
/// skipped. A repeated key keeps its last value at its first position.
pub fn parse_key_values(raw: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(crate::detect::strip_bom(raw));
    let mut pairs: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=').or_else(|| trimmed.split_once(':')) else {
            debug!("Skipping line without delimiter: {}", trimmed);
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().to_string();
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => pairs.push((key.to_string(), value)),
        }
    }
    pairs
}

/// Extractors by name
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn ConfigExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(KeyValueExtractor));
        registry.register(Box::new(IniExtractor));
        registry.register(Box::new(EmbeddedIniExtractor));
        registry
    }

    /// Add an extractor, replacing any previous one with the same name
    pub fn register(&mut self, extractor: Box<dyn ConfigExtractor>) {
        self.extractors.insert(extractor.name().to_string(), extractor);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ConfigExtractor> {
        self.extractors.get(name).map(|e| e.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Run the mapping's extractor over a service's expected configuration
pub fn extract_service(
    registry: &ExtractorRegistry,
    name: &str,
    mapping: &ServiceConfigMapping,
    raw: &[u8],
) -> Result<IniDocument> {
    if !mapping.enable {
        return Err(CfgDiffError::Config(format!("service '{}' is disabled", name)));
    }
    let extractor = registry.get(&mapping.extractor).ok_or_else(|| {
        CfgDiffError::UnknownService(format!(
            "{} (no extractor named '{}', available: {})",
            name,
            mapping.extractor,
            registry.names().join(", ")
        ))
    })?;
    info!("Extracting {} configuration with the {} extractor", name, extractor.name());
    extractor.extract(raw, mapping)
}

/// Compare a service's expected configuration with its live INI file.
///
/// The extracted document is the left side. The live file must parse as
/// INI; no line-comparison fallback is attempted here.
#[allow(clippy::too_many_arguments)]
pub fn compare_service(
    registry: &ExtractorRegistry,
    name: &str,
    mapping: &ServiceConfigMapping,
    extracted_raw: &[u8],
    live_raw: &[u8],
    extracted_label: &str,
    live_label: &str,
    options: &CompareOptions,
) -> Result<ComparisonReport> {
    options.scoped(|| -> Result<ComparisonReport> {
        let expected = extract_service(registry, name, mapping, extracted_raw)?;
        let live = IniDocument::parse(live_raw, live_label)?;
        Ok(compare_ini_documents(&expected, &live, extracted_label, live_label))
    })
}
