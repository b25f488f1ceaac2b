use crate::file_pair::FilePairComparator;
use crate::options::CompareOptions;
use cfgdiff_common::{CfgDiffError, Result, WalkReport};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::{Parallelism, WalkDir};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const REPORT_EXTENSION: &str = "diff";

/// Walks an origin tree against a destination tree and compares every file
/// pair whose contents differ.
///
/// Entries are visited in sorted order and compared one at a time. A failed
/// comparison is recorded in the report and the walk continues.
pub struct DirectoryWalker {
    comparator: FilePairComparator,
    custom_ignore: Option<Gitignore>,
}

impl DirectoryWalker {
    pub fn new(options: CompareOptions, ignore_patterns: &[String]) -> Self {
        Self {
            comparator: FilePairComparator::new(options),
            custom_ignore: build_custom_ignore(ignore_patterns),
        }
    }

    /// Walk `origin` against `destination`, then the other way round when
    /// `reverse` is set. Both passes feed the same report.
    pub fn walk(&self, origin: &Path, destination: &Path, reverse: bool) -> Result<WalkReport> {
        for root in [origin, destination] {
            if !root.is_dir() {
                return Err(CfgDiffError::Path(format!(
                    "'{}' is not a directory",
                    root.display()
                )));
            }
        }

        let mut report = WalkReport::new();
        let mut visited = HashSet::new();
        self.walk_once(origin, destination, &mut report, &mut visited);
        if reverse {
            info!("Reverse mode enabled, walk {} against {}", destination.display(), origin.display());
            self.walk_once(destination, origin, &mut report, &mut visited);
        }
        Ok(report)
    }

    fn walk_once(
        &self,
        origin: &Path,
        destination: &Path,
        report: &mut WalkReport,
        visited: &mut HashSet<PathBuf>,
    ) {
        let walker = WalkDir::new(origin)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .parallelism(Parallelism::Serial);

        // Subtrees that cannot be paired are skipped as a whole
        let mut skipped: Vec<PathBuf> = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| origin.to_path_buf());
                    warn!("Walk error under {}: {}", origin.display(), e);
                    report.record_failure(&path, format!("Walk error: {}", e));
                    continue;
                }
            };

            let path = entry.path();
            let relative = match path.strip_prefix(origin) {
                Ok(relative) => relative.to_path_buf(),
                Err(e) => {
                    report.record_failure(&path, e.to_string());
                    continue;
                }
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            if skipped.iter().any(|dir| relative.starts_with(dir)) {
                continue;
            }

            let origin_meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    report.record_failure(&path, format!("Failed to read metadata: {}", e));
                    continue;
                }
            };
            let is_dir = origin_meta.is_dir();

            if self.should_ignore_with_parents(&relative, is_dir) {
                debug!("Ignoring {}", path.display());
                if is_dir {
                    skipped.push(relative);
                }
                continue;
            }
            if !is_dir && is_report_file(&path) {
                continue;
            }

            let target = destination.join(&relative);
            let target_meta = match fs::metadata(&target) {
                Ok(meta) => meta,
                Err(_) => {
                    if report.record_missing(&path) {
                        if is_dir {
                            info!("Directory: {} not found in: {}", path.display(), destination.display());
                        } else {
                            warn!("File: {} not found in: {}", path.display(), destination.display());
                        }
                    }
                    if is_dir {
                        skipped.push(relative);
                    }
                    continue;
                }
            };

            match (is_dir, target_meta.is_dir()) {
                (true, true) => {}
                (true, false) => {
                    if report.record_wrong_type_in_origin(&path) {
                        warn!("{} is a directory but {} is a file", path.display(), target.display());
                    }
                    skipped.push(relative);
                }
                (false, true) => {
                    if report.record_wrong_type_in_destination(&target) {
                        warn!("{} is a file but {} is a directory", path.display(), target.display());
                    }
                }
                (false, false) => self.compare_pair(&path, &target, report, visited),
            }
        }
    }

    fn compare_pair(
        &self,
        path: &Path,
        target: &Path,
        report: &mut WalkReport,
        visited: &mut HashSet<PathBuf>,
    ) {
        if visited.contains(path) {
            debug!("{} already compared", path.display());
            return;
        }
        visited.insert(path.to_path_buf());
        visited.insert(target.to_path_buf());

        match (hash_file(path), hash_file(target)) {
            (Ok(left), Ok(right)) if left == right => {
                debug!("{} and {} have identical content", path.display(), target.display());
                return;
            }
            (Ok(_), Ok(_)) => {}
            (Err(e), _) | (_, Err(e)) => {
                report.record_failure(path, e.to_string());
                return;
            }
        }

        match self.comparator.compare_files(path, target) {
            Ok(pair_report) => {
                if !pair_report.has_differences() {
                    debug!("{} and {} differ only in ignored content", path.display(), target.display());
                }
                report.record_unmatched(path);
                report.record_unmatched(target);
            }
            Err(e) => {
                warn!("Comparison of {} and {} failed: {}", path.display(), target.display(), e);
                report.record_failure(path, e.to_string());
            }
        }
    }

    /// Check if a path or any of its parent directories should be ignored
    fn should_ignore_with_parents(&self, path: &Path, is_dir: bool) -> bool {
        let Some(ref custom_ignore) = self.custom_ignore else {
            return false;
        };
        if custom_ignore.matched(path, is_dir).is_ignore() {
            return true;
        }
        let mut current = path;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() && custom_ignore.matched(parent, true).is_ignore() {
                return true;
            }
            current = parent;
        }
        false
    }
}

/// Build a Gitignore matcher from configured ignore patterns
fn build_custom_ignore(patterns: &[String]) -> Option<Gitignore> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        if let Err(err) = builder.add_line(None, pattern) {
            debug!("Failed to add ignore pattern '{}': {}", pattern, err);
        }
    }

    match builder.build() {
        Ok(ignore) => Some(ignore),
        Err(e) => {
            warn!("Failed to build ignore patterns: {}", e);
            None
        }
    }
}

fn is_report_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == REPORT_EXTENSION)
}

fn hash_file(path: &Path) -> Result<blake3::Hash> {
    let mut file = fs::File::open(path).map_err(|e| {
        CfgDiffError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file: '{}'. {}", path.display(), e),
        ))
    })?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; 64 * 1024];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize())
}
