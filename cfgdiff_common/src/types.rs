use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Detected format of a configuration buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Ini,
    Yaml,
    Json,
    Raw,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Ini => "ini",
            FileKind::Yaml => "yaml",
            FileKind::Json => "json",
            FileKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Kind of a single reported difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    /// Rendered with a `+` prefix
    Added,
    /// Rendered with a `-` prefix
    Removed,
    /// Value differs on both sides
    Changed,
    SectionAdded,
    SectionRemoved,
    /// `@@ line: N` hunk marker of the line comparator
    LineMarker,
}

/// Where a difference was found; the variant depends on the comparator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    Section(String),
    Key { section: String, key: String },
    /// Dotted path inside a YAML/JSON tree, empty for the root
    Path(String),
    /// Zero-based line index
    Line(usize),
}

/// A single reported difference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub location: Location,
    pub left_value: Option<String>,
    pub right_value: Option<String>,
    /// First entry of an INI section in the report carries the `[section]` header
    #[serde(default)]
    pub opens_section: bool,
}

impl DiffEntry {
    fn new(
        kind: DiffKind,
        location: Location,
        left_value: Option<String>,
        right_value: Option<String>,
    ) -> Self {
        Self {
            kind,
            location,
            left_value,
            right_value,
            opens_section: false,
        }
    }

    pub fn section_removed(section: &str) -> Self {
        Self::new(DiffKind::SectionRemoved, Location::Section(section.to_string()), None, None)
    }

    pub fn section_added(section: &str) -> Self {
        Self::new(DiffKind::SectionAdded, Location::Section(section.to_string()), None, None)
    }

    /// Key present in the left INI document only
    pub fn key_removed(section: &str, key: &str, left: &str) -> Self {
        Self::new(
            DiffKind::Removed,
            Location::Key {
                section: section.to_string(),
                key: key.to_string(),
            },
            Some(left.to_string()),
            None,
        )
    }

    /// Key present in the right INI document only
    pub fn key_added(section: &str, key: &str, right: &str) -> Self {
        Self::new(
            DiffKind::Added,
            Location::Key {
                section: section.to_string(),
                key: key.to_string(),
            },
            None,
            Some(right.to_string()),
        )
    }

    pub fn key_changed(section: &str, key: &str, left: &str, right: &str) -> Self {
        Self::new(
            DiffKind::Changed,
            Location::Key {
                section: section.to_string(),
                key: key.to_string(),
            },
            Some(left.to_string()),
            Some(right.to_string()),
        )
    }

    /// Tree key present on the left (baseline) side only
    pub fn path_only_left(path: &str, left: &str) -> Self {
        Self::new(DiffKind::Added, Location::Path(path.to_string()), Some(left.to_string()), None)
    }

    /// Tree key present on the right side only
    pub fn path_only_right(path: &str, right: &str) -> Self {
        Self::new(DiffKind::Removed, Location::Path(path.to_string()), None, Some(right.to_string()))
    }

    pub fn path_changed(path: &str, left: &str, right: &str) -> Self {
        Self::new(
            DiffKind::Changed,
            Location::Path(path.to_string()),
            Some(left.to_string()),
            Some(right.to_string()),
        )
    }

    pub fn line_marker(index: usize) -> Self {
        Self::new(DiffKind::LineMarker, Location::Line(index), None, None)
    }

    pub fn line_only_left(index: usize, line: &str) -> Self {
        Self::new(DiffKind::Added, Location::Line(index), Some(line.to_string()), None)
    }

    pub fn line_only_right(index: usize, line: &str) -> Self {
        Self::new(DiffKind::Removed, Location::Line(index), None, Some(line.to_string()))
    }

    pub fn with_section_header(mut self, opens_section: bool) -> Self {
        self.opens_section = opens_section;
        self
    }

    /// Two entries describe the same finding regardless of header placement
    pub fn same_finding(&self, other: &DiffEntry) -> bool {
        self.kind == other.kind
            && self.location == other.location
            && self.left_value == other.left_value
            && self.right_value == other.right_value
    }

    /// Render the entry as report text; one entry may span several lines
    pub fn render(&self) -> String {
        let left = self.left_value.as_deref().unwrap_or_default();
        let right = self.right_value.as_deref().unwrap_or_default();

        match &self.location {
            Location::Section(section) => match self.kind {
                DiffKind::SectionAdded => format!("+[{}]\n", section),
                _ => format!("-[{}]\n", section),
            },
            Location::Key { section, key } => {
                let header = if self.opens_section {
                    format!("[{}]\n", section)
                } else {
                    String::new()
                };
                match self.kind {
                    DiffKind::Changed => format!("{}-{}={}\n+{}={}\n", header, key, left, key, right),
                    DiffKind::Added => format!("{}+{}={}\n", header, key, right),
                    _ => format!("{}-{}={}\n", header, key, left),
                }
            }
            Location::Path(path) => {
                let label = if path.is_empty() { "." } else { path.as_str() };
                match self.kind {
                    DiffKind::Changed => format!("+{}: {}\n-{}: {}\n", label, left, label, right),
                    DiffKind::Added => format!("+{}: {}\n", label, left),
                    _ => format!("-{}: {}\n", label, right),
                }
            }
            Location::Line(index) => match self.kind {
                DiffKind::LineMarker => format!("@@ line: {}\n", index),
                DiffKind::Added => format!("+{}\n", left),
                _ => format!("-{}\n", right),
            },
        }
    }
}

/// Ordered result of one file-pair comparison
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Summary line, set only when differences exist
    pub summary: Option<String>,
    pub entries: Vec<DiffEntry>,
}

impl ComparisonReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_differences(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.entries.is_empty()
    }

    pub fn contains(&self, entry: &DiffEntry) -> bool {
        self.position(entry).is_some()
    }

    pub fn position(&self, entry: &DiffEntry) -> Option<usize> {
        self.entries.iter().position(|e| e.same_finding(entry))
    }

    /// Append an entry unless the same finding is already reported
    pub fn append_unique(&mut self, entry: DiffEntry) -> bool {
        if self.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Insert an entry at `index` (clamped to the end) unless already reported
    pub fn insert_unique(&mut self, index: usize, entry: DiffEntry) -> bool {
        if self.contains(&entry) {
            return false;
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        true
    }

    /// Prepend the summary line when at least one entry was produced
    pub fn finish(&mut self, left_label: &str, right_label: &str) {
        if self.has_differences() {
            self.summary = Some(summary_line(left_label, right_label));
        }
    }

    /// Report text fragments in order: summary first, then every entry
    pub fn fragments(&self) -> Vec<String> {
        let mut fragments = Vec::with_capacity(self.entries.len() + 1);
        if let Some(summary) = &self.summary {
            fragments.push(summary.clone());
        }
        fragments.extend(self.entries.iter().map(DiffEntry::render));
        fragments
    }
}

pub fn summary_line(left_label: &str, right_label: &str) -> String {
    format!("Source file path: {}, difference with: {}\n", left_label, right_label)
}

/// A file pair that could not be compared during a directory walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate result of walking two directory trees
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkReport {
    pub missing_paths: Vec<PathBuf>,
    pub unmatched_files: Vec<PathBuf>,
    pub wrong_type_in_origin: Vec<PathBuf>,
    pub wrong_type_in_destination: Vec<PathBuf>,
    pub failures: Vec<WalkFailure>,
}

impl WalkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_differences(&self) -> bool {
        !self.missing_paths.is_empty()
            || !self.unmatched_files.is_empty()
            || !self.wrong_type_in_origin.is_empty()
            || !self.wrong_type_in_destination.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn record_missing(&mut self, path: &Path) -> bool {
        push_unique(&mut self.missing_paths, path)
    }

    pub fn record_unmatched(&mut self, path: &Path) -> bool {
        push_unique(&mut self.unmatched_files, path)
    }

    pub fn record_wrong_type_in_origin(&mut self, path: &Path) -> bool {
        push_unique(&mut self.wrong_type_in_origin, path)
    }

    pub fn record_wrong_type_in_destination(&mut self, path: &Path) -> bool {
        push_unique(&mut self.wrong_type_in_destination, path)
    }

    pub fn record_failure(&mut self, path: &Path, message: impl Into<String>) {
        self.failures.push(WalkFailure {
            path: path.to_path_buf(),
            message: message.into(),
        });
    }

    /// Plain-text summary of the walk
    pub fn render(&self) -> String {
        let mut out = String::from("\n**** Report ****\n");
        let sections: [(&str, &[PathBuf]); 4] = [
            ("Missing files or directories", self.missing_paths.as_slice()),
            ("Files with differences", self.unmatched_files.as_slice()),
            ("Different file type in origin", self.wrong_type_in_origin.as_slice()),
            ("Different file type in destination", self.wrong_type_in_destination.as_slice()),
        ];
        for (title, paths) in sections {
            if paths.is_empty() {
                continue;
            }
            out.push_str(&format!("\n**** {} ****\n", title));
            for path in paths {
                out.push_str(&format!("{}\n", path.display()));
            }
        }
        if !self.failures.is_empty() {
            out.push_str("\n**** Failed comparisons ****\n");
            for failure in &self.failures {
                out.push_str(&format!("{}: {}\n", failure.path.display(), failure.message));
            }
        }
        out
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: &Path) -> bool {
    if list.iter().any(|p| p == path) {
        return false;
    }
    list.push(path.to_path_buf());
    true
}

fn default_extractor() -> String {
    String::from("key-value")
}

fn default_section() -> String {
    String::from("DEFAULT")
}

fn default_true() -> bool {
    true
}

/// Where a logical service keeps its configuration, and how extracted keys map to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfigMapping {
    #[serde(default = "default_true")]
    pub enable: bool,

    /// On-disk configuration paths
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    #[serde(default)]
    pub pod_name: Option<String>,

    #[serde(default)]
    pub container_name: Option<String>,

    #[serde(default)]
    pub podman_name: Option<String>,

    /// Registry key of the extraction strategy
    #[serde(default = "default_extractor")]
    pub extractor: String,

    /// INI section receiving the extracted keys
    #[serde(default = "default_section")]
    pub section: String,

    /// Dotted path to an INI string embedded in a YAML document
    /// (e.g. `spec.glance.template.customServiceConfig`)
    #[serde(default)]
    pub source_path: Option<String>,

    /// Extracted key -> key name used by the service configuration
    #[serde(default)]
    pub config_mapping: BTreeMap<String, String>,
}

impl Default for ServiceConfigMapping {
    fn default() -> Self {
        Self {
            enable: true,
            paths: Vec::new(),
            pod_name: None,
            container_name: None,
            podman_name: None,
            extractor: default_extractor(),
            section: default_section(),
            source_path: None,
            config_mapping: BTreeMap::new(),
        }
    }
}

impl ServiceConfigMapping {
    /// Key name after applying the rename mapping
    pub fn mapped_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.config_mapping
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ignore patterns for directory walks (e.g., "*.bak", "cache/")
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Write `<left>.diff` next to the left file when differences exist
    #[serde(default = "default_true")]
    pub write_report: bool,

    /// Keep comparator log output
    #[serde(default)]
    pub verbose: bool,

    /// Walk destination against origin as well
    #[serde(default)]
    pub reverse: bool,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfigMapping>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            write_report: true,
            verbose: false,
            reverse: false,
            services: BTreeMap::new(),
        }
    }
}
