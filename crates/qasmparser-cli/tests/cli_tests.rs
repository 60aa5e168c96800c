//! End-to-end tests driving the `qasmparse` binary.
//!
//! Each test writes fixtures into a temporary directory and checks exit status
//! and output of one invocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const BELL: &str = "OPENQASM 3.0;\n// entangle\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\n\
                    c = measure q;\n";
const BROKEN: &str = "qubit[2] q\nh q[0];\nbit;\n";
const LEGACY: &str = "OPENQASM 2.0;\nqreg q[1];\nh q[0];\n";

fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn qasmparse(args: &[&str], files: &[&Path]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_qasmparse"));
    for var in [
        "QASMPARSER_CONFIG",
        "QASMPARSER_STRICT_MODE",
        "QASMPARSER_INCLUDE_COMMENTS",
        "QASMPARSER_ERROR_RECOVERY",
        "QASMPARSER_MAX_ERRORS",
    ] {
        cmd.env_remove(var);
    }
    cmd.args(args).args(files).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// parse
// ============================================================================

mod parse_command {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["parse"], &[&bell]);
        assert!(output.status.success(), "{}", stderr(&output));
        let text = stdout(&output);
        assert!(text.contains("bell.qasm: 5 statement(s), version 3.0, 1 comment(s)"), "{text}");
    }

    #[test]
    fn test_parse_reports_numbered_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let broken = fixture(&dir, "broken.qasm", BROKEN);

        let output = qasmparse(&["parse"], &[&broken]);
        assert_eq!(output.status.code(), Some(1));
        let text = stdout(&output);
        assert!(text.contains("broken.qasm: 2 error(s)"), "{text}");
        assert!(text.contains("1. syntax error at line 2, column 1"), "{text}");
        assert!(text.contains("2. syntax error at line 3"), "{text}");
        assert!(stderr(&output).contains("Error: 1 of 1 file(s) had errors"));
    }

    #[test]
    fn test_parse_json() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);
        let broken = fixture(&dir, "broken.qasm", BROKEN);

        let output = qasmparse(&["parse", "-f", "json"], &[&bell, &broken]);
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let reports = json.as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0]["filename"].as_str().unwrap().ends_with("bell.qasm"));
        assert!(reports[0].get("error").is_none());
        assert_eq!(reports[0]["parse_result"]["diagnostics"], serde_json::json!([]));
        assert_eq!(reports[1]["parse_result"]["diagnostics"][0]["kind"], "syntax");
    }

    #[test]
    fn test_errors_only_hides_clean_files() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["parse", "--errors-only"], &[&bell]);
        assert!(output.status.success());
        assert!(stdout(&output).is_empty());
    }

    #[test]
    fn test_missing_file_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);
        let missing = dir.path().join("missing.qasm");

        let output = qasmparse(&["parse"], &[&missing, &bell]);
        assert_eq!(output.status.code(), Some(1));
        let text = stdout(&output);
        assert!(text.contains("File not found"), "{text}");
        assert!(text.contains("bell.qasm: 5 statement(s)"), "{text}");
    }

    #[test]
    fn test_max_errors_flag() {
        let dir = tempfile::tempdir().unwrap();
        let many = fixture(&dir, "many.qasm", &"bit;\n".repeat(5));

        let output = qasmparse(&["parse", "--max-errors", "2"], &[&many]);
        let text = stdout(&output);
        assert!(text.contains("many.qasm: 2 error(s)"), "{text}");
    }
}

// ============================================================================
// validate
// ============================================================================

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_quiet_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["validate"], &[&bell]);
        assert!(output.status.success());
        assert!(stdout(&output).is_empty());
    }

    #[test]
    fn test_validate_verbose() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["validate", "-v"], &[&bell]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("bell.qasm: ✓ valid"));
    }

    #[test]
    fn test_validate_first_error_only() {
        let dir = tempfile::tempdir().unwrap();
        let broken = fixture(&dir, "broken.qasm", BROKEN);

        let output = qasmparse(&["validate"], &[&broken]);
        assert_eq!(output.status.code(), Some(1));
        let text = stdout(&output);
        assert_eq!(text.lines().count(), 1, "{text}");
        assert!(text.contains("broken.qasm: syntax error at line 2, column 1"), "{text}");
    }
}

// ============================================================================
// ast / stats / format
// ============================================================================

mod inspection_commands {
    use super::*;

    #[test]
    fn test_ast_tree() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["ast", "-f", "tree", "-d", "1"], &[&bell]);
        assert!(output.status.success(), "{}", stderr(&output));
        let text = stdout(&output);
        assert!(text.starts_with("Program (5 statements)"), "{text}");
        assert!(text.contains("├── Version 3.0"), "{text}");
        assert!(text.contains("└── Measurement"), "{text}");
        // Depth 1 hides operands.
        assert!(!text.contains("Identifier"), "{text}");
    }

    #[test]
    fn test_ast_json() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["ast", "--format", "json"], &[&bell]);
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json[0]["program"]["version"]["number"], "3.0");
        assert_eq!(json[0]["program"]["statements"][2]["type"], "GateCall");
    }

    #[test]
    fn test_stats_json() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["stats", "-f", "json"], &[&bell]);
        assert!(output.status.success(), "{}", stderr(&output));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let stats = &json[0];
        assert_eq!(stats["total_statements"], 5);
        assert_eq!(stats["quantum_declarations"], 1);
        assert_eq!(stats["classical_declarations"], 1);
        assert_eq!(stats["gate_calls"], 2);
        assert_eq!(stats["measurements"], 1);
        assert_eq!(stats["comments"], 1);
        assert_eq!(stats["unique_gates"], serde_json::json!(["h", "cx"]));
        assert_eq!(stats["max_qubit_index"], 1);
        assert_eq!(stats["version"], "3.0");
    }

    #[test]
    fn test_stats_text() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);

        let output = qasmparse(&["stats"], &[&bell]);
        let text = stdout(&output);
        assert!(text.contains("Gate calls:             2"), "{text}");
        assert!(text.contains("Unique gates:           h, cx"), "{text}");
    }

    #[test]
    fn test_format_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let messy = fixture(&dir, "messy.qasm", "OPENQASM 3.0;qubit[2]q;\nrx( pi/2 )q[0];");
        let out = dir.path().join("out.qasm");

        let output = qasmparse(&["format", "-o", out.to_str().unwrap()], &[&messy]);
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).is_empty());
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "OPENQASM 3.0;\nqubit[2] q;\nrx(pi / 2) q[0];\n"
        );
    }

    #[test]
    fn test_format_refuses_broken_input() {
        let dir = tempfile::tempdir().unwrap();
        let broken = fixture(&dir, "broken.qasm", BROKEN);

        let output = qasmparse(&["format"], &[&broken]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("refusing to format"));
    }
}

// ============================================================================
// configuration
// ============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_strict_flag() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = fixture(&dir, "legacy.qasm", LEGACY);

        assert!(qasmparse(&["validate"], &[&legacy]).status.success());

        let output = qasmparse(&["validate", "--strict"], &[&legacy]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("strict mode"));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = fixture(&dir, "legacy.qasm", LEGACY);
        let config = fixture(&dir, "qasmparser.yaml", "strict_mode: true\n");

        let output = qasmparse(
            &["validate", "--config", config.to_str().unwrap()],
            &[&legacy],
        );
        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_bad_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let bell = fixture(&dir, "bell.qasm", BELL);
        let config = fixture(&dir, "bad.yaml", "strict_mode: [\n");

        let output = qasmparse(&["parse", "--config", config.to_str().unwrap()], &[&bell]);
        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Failed to load config"));
    }

    #[test]
    fn test_environment_override() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = fixture(&dir, "legacy.qasm", LEGACY);

        let output = Command::new(env!("CARGO_BIN_EXE_qasmparse"))
            .env_remove("QASMPARSER_CONFIG")
            .env("QASMPARSER_STRICT_MODE", "yes")
            .arg("validate")
            .arg(&legacy)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));
    }

    #[test]
    fn test_version() {
        let output = qasmparse(&["version"], &[]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("qasmparse v"));
    }
}
