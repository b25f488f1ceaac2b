//! Tolerant INI parser.
//!
//! Keys before the first header belong to the implicit `DEFAULT` section,
//! which always exists. Repeated headers are kept as separate blocks in
//! source order; lookups treat all blocks of one name as a single section
//! where the last assignment wins.

use cfgdiff_common::{CfgDiffError, Result};

pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl Default for IniDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl IniDocument {
    pub fn new() -> Self {
        Self {
            sections: vec![IniSection::new(DEFAULT_SECTION)],
        }
    }

    /// Parse INI text; `label` names the source in error messages
    pub fn parse(data: &[u8], label: &str) -> Result<Self> {
        let text = String::from_utf8_lossy(crate::detect::strip_bom(data));
        let mut doc = IniDocument::new();
        let mut current = 0usize;

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if is_blank_or_comment(line) {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let (name, trailing) = rest.split_once(']').ok_or_else(|| {
                    parse_error(label, index, format!("unterminated section header '{}'", line))
                })?;
                if !is_blank_or_comment(trailing) {
                    return Err(parse_error(
                        label,
                        index,
                        format!("unexpected text after section header '{}'", line),
                    ));
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(parse_error(label, index, "empty section name"));
                }
                current = if name == DEFAULT_SECTION {
                    0
                } else {
                    doc.sections.push(IniSection::new(name));
                    doc.sections.len() - 1
                };
                continue;
            }

            let delimiter = line.find(|c: char| c == '=' || c == ':').ok_or_else(|| {
                parse_error(label, index, format!("key-value delimiter not found in '{}'", line))
            })?;
            let key = line[..delimiter].trim();
            if key.is_empty() {
                return Err(parse_error(label, index, "empty key name"));
            }
            let value = clean_value(&line[delimiter + 1..]);
            doc.sections[current]
                .entries
                .push((key.to_string(), value));
        }

        Ok(doc)
    }

    /// Section blocks in source order, `DEFAULT` first
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .rev()
            .filter(|s| s.name == section)
            .find_map(|s| s.get(key))
    }

    /// Distinct key/value pairs of a section across all of its blocks, first-seen order
    pub fn section_entries(&self, section: &str) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = Vec::new();
        for block in self.sections.iter().filter(|s| s.name == section) {
            for (key, _) in &block.entries {
                if entries.iter().any(|(k, _)| *k == key.as_str()) {
                    continue;
                }
                if let Some(value) = self.get(section, key) {
                    entries.push((key.as_str(), value));
                }
            }
        }
        entries
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let index = match self.sections.iter().rposition(|s| s.name == section) {
            Some(index) => index,
            None => {
                self.sections.push(IniSection::new(section));
                self.sections.len() - 1
            }
        };
        let entries = &mut self.sections[index].entries;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Serialize back to INI text, one block per section name, empty sections skipped
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        let mut written: Vec<&str> = Vec::new();
        for section in &self.sections {
            if written.contains(&section.name.as_str()) {
                continue;
            }
            written.push(section.name.as_str());
            let entries = self.section_entries(&section.name);
            if entries.is_empty() {
                continue;
            }
            out.push_str(&format!("[{}]\n", section.name));
            for (key, value) in entries {
                out.push_str(&format!("{}={}\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

fn parse_error(label: &str, index: usize, message: impl Into<String>) -> CfgDiffError {
    CfgDiffError::parse("ini", label, format!("line {}: {}", index + 1, message.into()))
}

fn is_blank_or_comment(text: &str) -> bool {
    let text = text.trim_start();
    text.is_empty() || text.starts_with('#') || text.starts_with(';')
}

fn clean_value(raw: &str) -> String {
    let value = raw.trim();
    if let Some(unquoted) = strip_quotes(value) {
        return unquoted.to_string();
    }
    strip_inline_comment(value).to_string()
}

fn strip_quotes(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return Some(&value[1..value.len() - 1]);
        }
    }
    None
}

fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if (*byte == b'#' || *byte == b';') && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return value[..i].trim_end();
        }
    }
    value
}
