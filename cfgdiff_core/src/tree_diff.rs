use crate::structured::StructuredValue;
use cfgdiff_common::{CfgDiffError, ComparisonReport, DiffEntry, FileKind, Result};
use tracing::{info, warn};

/// Recursively compare two tree values, left being the baseline.
///
/// Keys only on the left are reported as added (`+`), keys only on the right
/// as removed (`-`). Sequences are compared positionally. A type or length
/// mismatch anywhere aborts the whole comparison.
pub fn compare_tree(
    left: &StructuredValue,
    right: &StructuredValue,
    path: &str,
) -> Result<Vec<DiffEntry>> {
    let mut entries = Vec::new();
    walk(left, right, path, &mut entries)?;
    Ok(entries)
}

fn walk(
    left: &StructuredValue,
    right: &StructuredValue,
    path: &str,
    entries: &mut Vec<DiffEntry>,
) -> Result<()> {
    match (left, right) {
        (StructuredValue::Mapping(left_map), StructuredValue::Mapping(_)) => {
            for (key, left_value) in left_map {
                let child = join_key(path, key);
                match right.get(key) {
                    Some(right_value) => walk(left_value, right_value, &child, entries)?,
                    None => {
                        warn!("Key {} not found in right document", child);
                        entries.push(DiffEntry::path_only_left(&child, &left_value.render()));
                    }
                }
            }
            if let StructuredValue::Mapping(right_map) = right {
                for (key, right_value) in right_map {
                    if left.get(key).is_none() {
                        let child = join_key(path, key);
                        warn!("Key {} not found in left document", child);
                        entries.push(DiffEntry::path_only_right(&child, &right_value.render()));
                    }
                }
            }
            Ok(())
        }
        (StructuredValue::Sequence(left_items), StructuredValue::Sequence(right_items)) => {
            if left_items.len() != right_items.len() {
                return Err(CfgDiffError::structure(
                    path,
                    format!(
                        "sequence length mismatch: {} != {}",
                        left_items.len(),
                        right_items.len()
                    ),
                ));
            }
            for (index, (l, r)) in left_items.iter().zip(right_items).enumerate() {
                walk(l, r, &format!("{}[{}]", path, index), entries)?;
            }
            Ok(())
        }
        (StructuredValue::Scalar(l), StructuredValue::Scalar(r)) => {
            if l != r {
                warn!("Value mismatch at {}: {} != {}", path, l, r);
                entries.push(DiffEntry::path_changed(path, l, r));
            }
            Ok(())
        }
        _ => Err(CfgDiffError::structure(
            path,
            format!("type mismatch: {} != {}", left.kind_name(), right.kind_name()),
        )),
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Parse two YAML or JSON buffers and compare them as trees.
///
/// Parse failures are returned as parse errors so the caller can fall back
/// to the line comparator; structural mismatches are returned as-is.
pub fn compare_structured(
    left: &[u8],
    right: &[u8],
    kind: FileKind,
    left_label: &str,
    right_label: &str,
) -> Result<ComparisonReport> {
    info!("Comparing {} content of {} and {}", kind, left_label, right_label);
    let left_value = StructuredValue::parse(left, kind, left_label)?;
    let right_value = StructuredValue::parse(right, kind, right_label)?;

    let mut report = ComparisonReport::new();
    for entry in compare_tree(&left_value, &right_value, "")? {
        report.append_unique(entry);
    }
    if report.has_differences() {
        warn!("File: {} has difference with: {}", left_label, right_label);
    }
    report.finish(left_label, right_label);
    Ok(report)
}
