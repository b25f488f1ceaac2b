use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Temporary origin/destination trees plus an isolated configuration file
struct TestFixture {
    temp_dir: TempDir,
    left_dir: PathBuf,
    right_dir: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let left_dir = temp_dir.path().join("left");
        let right_dir = temp_dir.path().join("right");
        fs::create_dir(&left_dir).expect("Failed to create left dir");
        fs::create_dir(&right_dir).expect("Failed to create right dir");
        TestFixture {
            temp_dir,
            left_dir,
            right_dir,
        }
    }

    fn create_left_file(&self, path: &str, content: &str) -> PathBuf {
        create_file(&self.left_dir, path, content)
    }

    fn create_right_file(&self, path: &str, content: &str) -> PathBuf {
        create_file(&self.right_dir, path, content)
    }

    fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("cfgdiff.toml")
    }

    fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("Failed to write config");
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cfgdiff_cli"))
            .args(args)
            .env("CFGDIFF_CONFIG", self.config_path())
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run cfgdiff_cli")
    }
}

fn create_file(base: &Path, path: &str, content: &str) -> PathBuf {
    let file_path = base.join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(&file_path, content).expect("Failed to write file");
    file_path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("non utf-8 temp path")
}

#[test]
fn test_identical_files_exit_zero() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("nova.conf", "[DEFAULT]\ndebug=true\n");
    let right = fixture.create_right_file("nova.conf", "[DEFAULT]\ndebug=true\n");

    let output = fixture.run(&["diff", arg(&left), arg(&right)]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(!fixture.left_dir.join("nova.conf.diff").exists());
}

#[test]
fn test_ini_difference_printed_and_written() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("keystone.conf", "[DEFAULT]\nfoo=1\nbar=2\n");
    let right = fixture.create_right_file("keystone.conf", "[DEFAULT]\nfoo=9\n");

    let output = fixture.run(&["diff", arg(&left), arg(&right)]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    // Not a terminal, so no color codes
    let lines: Vec<String> = stdout(&output).lines().map(String::from).collect();
    assert_eq!(
        lines,
        vec![
            format!("Source file path: {}, difference with: {}", left.display(), right.display()),
            "[DEFAULT]".to_string(),
            "-foo=1".to_string(),
            "+foo=9".to_string(),
            "-bar=2".to_string(),
        ]
    );

    let written = fs::read_to_string(fixture.left_dir.join("keystone.conf.diff")).unwrap();
    assert!(written.ends_with("[DEFAULT]\n-foo=1\n+foo=9\n-bar=2\n"));
}

#[test]
fn test_quiet_and_no_report() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("app.yaml", "replicas: 1\n");
    let right = fixture.create_right_file("app.yaml", "replicas: 3\n");

    let output = fixture.run(&["diff", arg(&left), arg(&right), "--quiet", "--no-report"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(!fixture.left_dir.join("app.yaml.diff").exists());
}

#[test]
fn test_config_can_disable_report_files() {
    let fixture = TestFixture::new();
    fixture.write_config("write_report = false\n");
    let left = fixture.create_left_file("a.txt", "one\n");
    let right = fixture.create_right_file("a.txt", "two\n");

    let output = fixture.run(&["diff", arg(&left), arg(&right)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("@@ line: 0"));
    assert!(!fixture.left_dir.join("a.txt.diff").exists());
}

#[test]
fn test_directory_walk_report() {
    let fixture = TestFixture::new();
    fixture.create_left_file("glance/glance-api.conf", "[DEFAULT]\ndebug=true\n");
    fixture.create_right_file("glance/glance-api.conf", "[DEFAULT]\ndebug=false\n");
    fixture.create_left_file("nova/nova.conf", "[DEFAULT]\n");
    fixture.create_left_file("same.json", "{\"a\": 1}");
    fixture.create_right_file("same.json", "{\"a\": 1}");

    let output = fixture.run(&["diff", arg(&fixture.left_dir), arg(&fixture.right_dir)]);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("**** Report ****"));
    assert!(out.contains("**** Missing files or directories ****"));
    assert!(out.contains(&fixture.left_dir.join("nova").display().to_string()));
    assert!(out.contains("**** Files with differences ****"));
    assert!(out.contains(&fixture.right_dir.join("glance/glance-api.conf").display().to_string()));
    assert!(!out.contains("same.json"));
    assert!(fixture.left_dir.join("glance/glance-api.conf.diff").exists());
}

#[test]
fn test_reverse_walk_json() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.conf", "x=1\n");
    fixture.create_right_file("a.conf", "x=1\n");
    fixture.create_right_file("extra/b.conf", "y=1\n");

    let output = fixture.run(&["diff", arg(&fixture.left_dir), arg(&fixture.right_dir), "--json"]);
    assert_eq!(output.status.code(), Some(0), "forward walk sees no difference");
    let report: Value = serde_json::from_str(&stdout(&output)).expect("invalid json output");
    assert_eq!(report["different"], Value::Bool(false));

    let output = fixture.run(&[
        "diff",
        arg(&fixture.left_dir),
        arg(&fixture.right_dir),
        "--json",
        "--reverse",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_str(&stdout(&output)).expect("invalid json output");
    assert_eq!(report["different"], Value::Bool(true));
    let missing = report["report"]["missing_paths"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(
        missing[0].as_str().unwrap(),
        fixture.right_dir.join("extra").display().to_string()
    );
}

#[test]
fn test_ignore_patterns_from_config_and_flags() {
    let fixture = TestFixture::new();
    fixture.write_config("ignore_patterns = [\"*.bak\"]\n");
    fixture.create_left_file("old.bak", "x\n");
    fixture.create_left_file("cache/tmp.conf", "x=1\n");

    let output = fixture.run(&[
        "diff",
        arg(&fixture.left_dir),
        arg(&fixture.right_dir),
        "--ignore",
        "cache/",
    ]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}

#[test]
fn test_detect_formats() {
    let fixture = TestFixture::new();
    let cases = [
        ("a.conf", "[DEFAULT]\nx=1\n", "ini"),
        ("b.yaml", "a: 1\n", "yaml"),
        ("c.json", "{\"a\": 1}", "json"),
        ("d.txt", "just some words\n", "raw"),
    ];
    for (name, content, expected) in cases {
        let path = fixture.create_left_file(name, content);
        let output = fixture.run(&["detect", arg(&path)]);
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout(&output).trim(), expected, "{}", name);
    }
}

#[test]
fn test_service_comparison_with_rename() {
    let fixture = TestFixture::new();
    fixture.write_config(
        "[services.glance]\nsection = \"DEFAULT\"\n\n[services.glance.config_mapping]\nGlanceDebug = \"debug\"\n",
    );
    let expected = fixture.create_left_file("glance.env", "GlanceDebug=true\n");
    let live = fixture.create_right_file("glance-api.conf", "[DEFAULT]\ndebug=true\n");

    let output = fixture.run(&["service", "glance", "--expected", arg(&expected), "--live", arg(&live)]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    fs::write(&live, "[DEFAULT]\ndebug=false\n").unwrap();
    let output = fixture.run(&[
        "service",
        "glance",
        "--expected",
        arg(&expected),
        "--live",
        arg(&live),
        "--side-by-side",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("-debug=true\n+debug=false"));
    assert!(out.contains("-debug=false\n+debug=true"));
}

#[test]
fn test_unknown_service_is_operational_error() {
    let fixture = TestFixture::new();
    let expected = fixture.create_left_file("nova.env", "a=1\n");
    let live = fixture.create_right_file("nova.conf", "a=1\n");

    let output = fixture.run(&["service", "nova", "--expected", arg(&expected), "--live", arg(&live)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Service not supported"));
}

#[test]
fn test_missing_input_is_operational_error() {
    let fixture = TestFixture::new();
    let right = fixture.create_right_file("x.conf", "a=1\n");
    let missing = fixture.left_dir.join("absent.conf");

    let output = fixture.run(&["diff", arg(&missing), arg(&right)]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Failed to open file"));
}

#[test]
fn test_file_against_directory_is_operational_error() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("x.conf", "a=1\n");

    let output = fixture.run(&["diff", arg(&left), arg(&fixture.right_dir)]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_debug_logs_resolved_config_path() {
    let fixture = TestFixture::new();
    fixture.write_config("verbose = false\n");
    let left = fixture.create_left_file("a.conf", "x=1\n");
    let right = fixture.create_right_file("a.conf", "x=1\n");

    let output = fixture.run(&["--debug", "diff", arg(&left), arg(&right)]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("Loaded configuration from"), "stderr: {}", err);
    assert!(err.contains(&fixture.config_path().display().to_string()));
}

#[test]
fn test_comparator_logs_follow_verbose_flag() {
    let fixture = TestFixture::new();
    let left = fixture.create_left_file("a.conf", "[DEFAULT]\nx=1\n");
    let right = fixture.create_right_file("a.conf", "[DEFAULT]\nx=2\n");

    let output = fixture.run(&["diff", arg(&left), arg(&right), "--no-report"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).contains("Start to compare file contents"));

    let output = fixture.run(&["diff", arg(&left), arg(&right), "--no-report", "--verbose"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Start to compare file contents"));
}
