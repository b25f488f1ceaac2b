use crate::ini::IniDocument;
use cfgdiff_common::{ComparisonReport, DiffEntry, Result};
use std::collections::HashSet;
use tracing::{info, warn};

/// Parse both buffers as INI and compare them section by section.
///
/// A parse failure on either side is returned; the caller decides whether to
/// fall back to the line comparator.
pub fn compare_ini(
    left: &[u8],
    right: &[u8],
    left_label: &str,
    right_label: &str,
) -> Result<ComparisonReport> {
    let left_doc = IniDocument::parse(left, left_label)?;
    let right_doc = IniDocument::parse(right, right_label)?;
    Ok(compare_ini_documents(&left_doc, &right_doc, left_label, right_label))
}

pub fn compare_ini_documents(
    left: &IniDocument,
    right: &IniDocument,
    left_label: &str,
    right_label: &str,
) -> ComparisonReport {
    info!("Comparing INI content of {} and {}", left_label, right_label);
    let mut hunk = SectionHunks::default();
    let mut visited: HashSet<&str> = HashSet::new();

    for section in left.sections() {
        let name = section.name.as_str();
        if !visited.insert(name) {
            continue;
        }

        if !right.has_section(name) {
            if hunk.report.append_unique(DiffEntry::section_removed(name)) {
                warn!("Difference detected. Section: {} not found in: {}", name, right_label);
            }
            for (key, value) in left.section_entries(name) {
                hunk.push(name, DiffEntry::key_removed(name, key, value));
            }
            continue;
        }

        for (key, left_value) in left.section_entries(name) {
            match right.get(name, key) {
                None => {
                    if hunk.push(name, DiffEntry::key_removed(name, key, left_value)) {
                        warn!(
                            "Difference detected. Section: {} Key {} not found in: {}",
                            name, key, right_label
                        );
                    }
                }
                Some(right_value) if right_value != left_value => {
                    if hunk.push(name, DiffEntry::key_changed(name, key, left_value, right_value)) {
                        warn!(
                            "Difference detected: Values are not equal: {} and {} Section: {} Key {}",
                            left_value, right_value, name, key
                        );
                    }
                }
                Some(_) => {}
            }
        }

        for (key, right_value) in right.section_entries(name) {
            if left.get(name, key).is_none()
                && hunk.push(name, DiffEntry::key_added(name, key, right_value))
            {
                warn!(
                    "Difference detected -- Section: {} Key {} not found in: {}",
                    name, key, left_label
                );
            }
        }
    }

    for section in right.sections() {
        let name = section.name.as_str();
        if left.has_section(name) || !visited.insert(name) {
            continue;
        }
        if hunk.report.append_unique(DiffEntry::section_added(name)) {
            warn!("Difference detected. Section: {} not found in: {}", name, left_label);
        }
        for (key, value) in right.section_entries(name) {
            hunk.push(name, DiffEntry::key_added(name, key, value));
        }
    }

    let mut report = hunk.report;
    if report.has_differences() {
        warn!("File: {} has difference with: {}", left_label, right_label);
    }
    report.finish(left_label, right_label);
    report
}

/// Report under construction plus the sections whose header was already emitted
#[derive(Default)]
struct SectionHunks {
    report: ComparisonReport,
    opened: HashSet<String>,
}

impl SectionHunks {
    fn push(&mut self, section: &str, entry: DiffEntry) -> bool {
        let opens = !self.opened.contains(section);
        let appended = self.report.append_unique(entry.with_section_header(opens));
        if appended && opens {
            self.opened.insert(section.to_string());
        }
        appended
    }
}
