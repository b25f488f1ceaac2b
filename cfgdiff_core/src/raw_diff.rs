use cfgdiff_common::{ComparisonReport, DiffEntry};
use std::collections::HashSet;
use tracing::{info, warn};

/// Line comparator for content without a usable structure.
///
/// This is a set difference, not an edit script: a line is reported only if
/// it appears nowhere on the other side, so reordering produces no entries.
/// Comment (`#`) and blank lines never take part in the comparison.
///
/// Right-only lines whose index matches an existing `@@ line: N` marker are
/// placed under that marker, even though the marker was opened by the left
/// pass with a left-side index.
pub fn compare_raw(
    left: &[u8],
    right: &[u8],
    left_label: &str,
    right_label: &str,
) -> ComparisonReport {
    info!("Start basic line by line comparison of {} and {}", left_label, right_label);
    let left_text = String::from_utf8_lossy(left);
    let right_text = String::from_utf8_lossy(right);
    let left_lines: Vec<&str> = left_text.split('\n').collect();
    let right_lines: Vec<&str> = right_text.split('\n').collect();

    let left_set = comparable_set(&left_lines);
    let right_set = comparable_set(&right_lines);

    let mut report = ComparisonReport::new();

    for (index, line) in left_lines.iter().enumerate() {
        if !is_comparable(line) || right_set.contains(line) {
            continue;
        }
        warn!("Line: {} not found in: {} line: {}", line, right_label, index);
        report.append_unique(DiffEntry::line_marker(index));
        report.append_unique(DiffEntry::line_only_left(index, line));
    }

    for (index, line) in right_lines.iter().enumerate() {
        if !is_comparable(line) || left_set.contains(line) {
            continue;
        }
        warn!("Line: {} not found in: {} line: {}", line, left_label, index);
        let marker = DiffEntry::line_marker(index);
        let entry = DiffEntry::line_only_right(index, line);
        match report.position(&marker) {
            // Coalesce under the existing hunk: marker, its `+` line, then this one
            Some(position) => {
                report.insert_unique(position + 2, entry);
            }
            None => {
                report.append_unique(marker);
                report.append_unique(entry);
            }
        }
    }

    if report.has_differences() {
        warn!("File: {} has difference with: {}", left_label, right_label);
    }
    report.finish(left_label, right_label);
    report
}

fn is_comparable(line: &str) -> bool {
    !line.starts_with('#') && !line.trim().is_empty()
}

fn comparable_set<'a>(lines: &[&'a str]) -> HashSet<&'a str> {
    lines.iter().copied().filter(|l| is_comparable(l)).collect()
}
