use cfgdiff_common::FileKind;
use serde_yaml::Value as YamlValue;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Classify a configuration buffer. Never fails: unrecognized content is raw.
pub fn detect(data: &[u8]) -> FileKind {
    let data = strip_bom(data);
    let first = match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(byte) => *byte,
        None => return FileKind::Raw,
    };

    if first == b'[' {
        FileKind::Ini
    } else if is_json(data) {
        FileKind::Json
    } else if is_yaml(data) {
        FileKind::Yaml
    } else {
        FileKind::Raw
    }
}

pub fn is_json(data: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(strip_bom(data)).is_ok()
}

/// A bare scalar document is plain text, not YAML
pub fn is_yaml(data: &[u8]) -> bool {
    matches!(
        serde_yaml::from_slice::<YamlValue>(strip_bom(data)),
        Ok(YamlValue::Mapping(_)) | Ok(YamlValue::Sequence(_))
    )
}

pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Read a file and classify its content
pub fn detect_file(path: &Path) -> std::io::Result<FileKind> {
    let data = std::fs::read(path)?;
    Ok(detect(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_blank_buffers_are_raw() {
        assert_eq!(detect(b""), FileKind::Raw);
        assert_eq!(detect(b"   \n\t\n"), FileKind::Raw);
        assert_eq!(detect(UTF8_BOM), FileKind::Raw);
    }

    #[test]
    fn test_bracket_first_is_ini() {
        assert_eq!(detect(b"["), FileKind::Ini);
        assert_eq!(detect(b"[DEFAULT]\ndebug=true\n"), FileKind::Ini);
        assert_eq!(detect(b"\n  [database]\nconnection=x"), FileKind::Ini);
        assert_eq!(detect(b"\xEF\xBB\xBF[DEFAULT]\n"), FileKind::Ini);
    }

    #[test]
    fn test_json_detection() {
        assert_eq!(detect(br#"{"name": "John", "age": 30}"#), FileKind::Json);
        assert_eq!(detect(b"{}"), FileKind::Json);
        assert!(!is_json(b"{invalid_json}"));
        assert!(!is_json(br#"{"key": "value""#));
        assert!(!is_json(b""));
    }

    #[test]
    fn test_yaml_detection() {
        assert_eq!(detect(b"key: value\n"), FileKind::Yaml);
        assert_eq!(detect(b"- a\n- b\n"), FileKind::Yaml);
        assert!(!is_yaml(b"key: value:"));
        assert!(!is_yaml(b"{"));
    }

    #[test]
    fn test_plain_text_is_raw() {
        assert_eq!(detect(b"just some words\nanother line\n"), FileKind::Raw);
        assert_eq!(detect(b"abc"), FileKind::Raw);
        assert_eq!(detect(b"key: value:\n"), FileKind::Raw);
    }

    #[test]
    fn test_detector_is_total_on_arbitrary_bytes() {
        let samples: [&[u8]; 6] = [b"\xFF\xFE\x00", b"\x00", b"]", b"{{{", b"---\n", b"#comment"];
        for sample in samples {
            let kind = detect(sample);
            assert!(matches!(
                kind,
                FileKind::Ini | FileKind::Yaml | FileKind::Json | FileKind::Raw
            ));
        }
    }
}
