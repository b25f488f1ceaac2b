use cfgdiff_common::{CfgDiffError, ComparisonReport};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Unmodified report text, as written to the `.diff` file
pub fn render_plain(report: &ComparisonReport) -> String {
    report.fragments().concat()
}

/// Output lines of the report.
///
/// Entries are joined and re-split, so one entry may yield several lines.
/// With `color`, `+` lines are green and `-` lines red.
pub fn render_lines(report: &ComparisonReport, color: bool) -> Vec<String> {
    let joined = render_plain(report);
    let mut lines: Vec<String> = joined
        .split('\n')
        .map(|line| {
            if !color {
                line.to_string()
            } else if line.starts_with('+') {
                format!("{}{}{}", GREEN, line, RESET)
            } else if line.starts_with('-') {
                format!("{}{}{}", RED, line, RESET)
            } else {
                line.to_string()
            }
        })
        .collect();
    if joined.ends_with('\n') {
        lines.pop();
    }
    lines
}

pub fn print_report(report: &ComparisonReport, color: bool) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in render_lines(report, color) {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Path of the report file for a left-hand input
pub fn report_path(left_label: &str) -> PathBuf {
    PathBuf::from(format!("{}.diff", left_label))
}

/// Write the plain report to `<left_label>.diff`, creating parent directories.
///
/// Nothing is written for an empty report.
pub fn write_report(
    report: &ComparisonReport,
    left_label: &str,
) -> Result<Option<PathBuf>, CfgDiffError> {
    if report.is_empty() {
        return Ok(None);
    }
    let path = report_path(left_label);
    write_report_to(report, &path)?;
    Ok(Some(path))
}

pub fn write_report_to(report: &ComparisonReport, path: &Path) -> Result<(), CfgDiffError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, render_plain(report)).map_err(|e| {
        error!("Failed to write diff file in: {}", path.display());
        CfgDiffError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write report file: '{}'. {}", path.display(), e),
        ))
    })?;
    info!("Write diff file: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini_diff::compare_ini;
    use tempfile::TempDir;

    fn sample_report() -> ComparisonReport {
        compare_ini(b"[DEFAULT]\nfoo=1\nbar=2", b"[DEFAULT]\nfoo=9", "left.conf", "right.conf").unwrap()
    }

    #[test]
    fn test_composite_entries_split_into_lines() {
        let lines = render_lines(&sample_report(), false);
        assert_eq!(
            lines,
            vec![
                "Source file path: left.conf, difference with: right.conf",
                "[DEFAULT]",
                "-foo=1",
                "+foo=9",
                "-bar=2",
            ]
        );
    }

    #[test]
    fn test_color_by_prefix() {
        let lines = render_lines(&sample_report(), true);
        assert_eq!(lines[1], "[DEFAULT]");
        assert_eq!(lines[2], format!("{}-foo=1{}", RED, RESET));
        assert_eq!(lines[3], format!("{}+foo=9{}", GREEN, RESET));
        assert!(!lines[0].contains('\x1b'));
    }

    #[test]
    fn test_empty_report_renders_nothing() {
        let report = ComparisonReport::new();
        assert!(render_lines(&report, true).is_empty());
        assert_eq!(render_plain(&report), "");
    }

    #[test]
    fn test_write_report_creates_parents() {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("nested").join("deeper").join("keystone.conf");
        let label = left.to_string_lossy().to_string();

        let report = sample_report();
        let written = write_report(&report, &label).unwrap().unwrap();

        assert_eq!(written, dir.path().join("nested/deeper/keystone.conf.diff"));
        assert_eq!(fs::read_to_string(&written).unwrap(), render_plain(&report));
    }

    #[test]
    fn test_write_report_skips_empty() {
        let dir = TempDir::new().unwrap();
        let label = dir.path().join("same.conf").to_string_lossy().to_string();
        assert!(write_report(&ComparisonReport::new(), &label).unwrap().is_none());
        assert!(!dir.path().join("same.conf.diff").exists());
    }
}
