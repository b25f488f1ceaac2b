pub mod detect;
pub mod ini;
pub mod structured;
pub mod options;
pub mod ini_diff;
pub mod tree_diff;
pub mod raw_diff;
pub mod render;
pub mod file_pair;
pub mod walker;
pub mod service;

pub use detect::{detect, detect_file};
pub use ini::{IniDocument, IniSection, DEFAULT_SECTION};
pub use structured::StructuredValue;
pub use options::CompareOptions;
pub use ini_diff::{compare_ini, compare_ini_documents};
pub use tree_diff::{compare_structured, compare_tree};
pub use raw_diff::compare_raw;
pub use render::{print_report, render_lines, render_plain, report_path, write_report};
pub use file_pair::FilePairComparator;
pub use walker::DirectoryWalker;
pub use service::{
    compare_service, extract_service, ConfigExtractor, EmbeddedIniExtractor, ExtractorRegistry,
    IniExtractor, KeyValueExtractor,
};
