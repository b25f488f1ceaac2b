use crate::detect::detect;
use crate::ini_diff::compare_ini;
use crate::options::CompareOptions;
use crate::raw_diff::compare_raw;
use crate::render::write_report;
use crate::tree_diff::compare_structured;
use cfgdiff_common::{CfgDiffError, ComparisonReport, FileKind, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Compares one pair of configuration buffers or files
#[derive(Debug, Clone, Default)]
pub struct FilePairComparator {
    options: CompareOptions,
}

impl FilePairComparator {
    pub fn new(options: CompareOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Detect both sides and run the matching comparator.
    ///
    /// Parse failures fall back to the line comparator; structural
    /// mismatches inside a YAML/JSON tree are returned.
    pub fn compare_bytes(
        &self,
        left: &[u8],
        right: &[u8],
        left_label: &str,
        right_label: &str,
    ) -> Result<ComparisonReport> {
        self.options
            .scoped(|| compare_detected(left, right, left_label, right_label))
    }

    /// Read both files, compare them and write `<left>.diff` when enabled
    pub fn compare_files(&self, left: &Path, right: &Path) -> Result<ComparisonReport> {
        let left_label = left.to_string_lossy();
        let right_label = right.to_string_lossy();

        self.options.scoped(|| -> Result<ComparisonReport> {
            info!(
                "Start to compare file contents for: {} and: {}",
                left.display(),
                right.display()
            );
            let left_content = read_input(left)?;
            let right_content = read_input(right)?;
            let report = compare_detected(&left_content, &right_content, &left_label, &right_label)?;

            if self.options.write_report {
                write_report(&report, &left_label)?;
            }
            Ok(report)
        })
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        error!("Failed to read file {}", path.display());
        CfgDiffError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file: '{}'. {}", path.display(), e),
        ))
    })
}

fn compare_detected(
    left: &[u8],
    right: &[u8],
    left_label: &str,
    right_label: &str,
) -> Result<ComparisonReport> {
    let left_kind = detect(left);
    let right_kind = detect(right);

    if left_kind != right_kind {
        info!(
            "Format mismatch ({} vs {}), process to a standard line by line comparison",
            left_kind, right_kind
        );
        return Ok(compare_raw(left, right, left_label, right_label));
    }

    let structured = match left_kind {
        FileKind::Ini => {
            info!("Files detected as INI files, start to process contents");
            compare_ini(left, right, left_label, right_label)
        }
        FileKind::Json | FileKind::Yaml => {
            info!("Files detected as {} files, start to process contents", left_kind);
            compare_structured(left, right, left_kind, left_label, right_label)
        }
        FileKind::Raw => {
            info!("No specific type detected, process to a standard line by line comparison");
            return Ok(compare_raw(left, right, left_label, right_label));
        }
    };

    match structured {
        Err(err) if err.is_parse() => {
            warn!(
                "Error while processing files: {} and {} ({}), try to compare as a standard type",
                left_label, right_label, err
            );
            Ok(compare_raw(left, right, left_label, right_label))
        }
        other => other,
    }
}
