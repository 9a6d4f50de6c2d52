//! CLI smoke tests against the built `iinv` binary.

mod common;

use std::fs;

use serde_json::Value;

fn parse_json_line(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim()).expect("stdout is a single JSON line")
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: iinv [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_reports_package_metadata() {
    let result = common::run_cli_case("version_command", &["version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["binary"], "iinv");
    assert_eq!(payload["package"], "integrity_inventory");
}

#[test]
fn subcommand_help_flags_work() {
    for subcmd in ["form", "analyze", "config", "version"] {
        let case_name = format!("subcommand_{subcmd}_help");
        let result = common::run_cli_case(&case_name, &[subcmd, "--help"]);
        assert!(
            result.status.success(),
            "subcommand '{subcmd} --help' failed; log: {}",
            result.log_path.display()
        );
        assert!(
            result.stdout.contains("Usage"),
            "subcommand '{subcmd} --help' missing usage info; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn form_command_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bank = common::write_bank(dir.path(), &common::hexaco_bank(20, 2));
    let bank_arg = bank.to_string_lossy().to_string();
    let args = ["form", "--bank", bank_arg.as_str(), "--size", "120", "--seed", "11"];

    let first = common::run_cli_case("form_seeded_first", &args);
    let second = common::run_cli_case("form_seeded_second", &args);
    assert!(first.status.success(), "log: {}", first.log_path.display());

    let payload = parse_json_line(&first.stdout);
    assert_eq!(payload["command"], "form");
    assert_eq!(payload["seed"], 11);
    let entries = payload["entries"].as_array().expect("entries array");
    assert_eq!(entries.len() as u64, payload["size"].as_u64().expect("size"));
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn analyze_command_emits_report_envelope() {
    let dir = tempfile::tempdir().expect("temp dir");
    let session = dir.path().join("session.toml");
    fs::write(
        &session,
        r#"
[[responses]]
item_id = "c1"
category = "conscientiousness"
raw_answer = 5
latency_seconds = 3.0

[[responses]]
item_id = "c2"
category = "conscientiousness"
raw_answer = 1
reverse = "yes"
latency_seconds = 4.5
"#,
    )
    .expect("write session");
    let session_arg = session.to_string_lossy().to_string();

    let result = common::run_cli_case("analyze_envelope", &["analyze", "--responses", &session_arg]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["command"], "analyze");
    assert!(payload["generated_at"].is_string());
    assert_eq!(payload["report"]["response_count"], 2);
    assert_eq!(payload["report"]["fit"]["score"], 100);
    assert_eq!(payload["report"]["reliability"]["score"], 100);
}

#[test]
fn analysis_summary_is_logged_at_debug_only() {
    let dir = tempfile::tempdir().expect("temp dir");
    let session = dir.path().join("session.json");
    fs::write(
        &session,
        r#"[{"id": 1, "trait": "openness", "original_answer": 4, "time_taken": 3.0}]"#,
    )
    .expect("write session");
    let session_arg = session.to_string_lossy().to_string();
    let args = ["analyze", "--responses", session_arg.as_str()];

    let info = common::run_cli_case_with_env("analyze_log_info", &args, &[("IINV_LOG", "info")]);
    assert!(info.status.success(), "log: {}", info.log_path.display());
    assert!(
        !info.stderr.contains("analysis complete"),
        "log: {}",
        info.log_path.display()
    );

    let debug = common::run_cli_case_with_env("analyze_log_debug", &args, &[("IINV_LOG", "debug")]);
    assert!(debug.status.success(), "log: {}", debug.log_path.display());
    assert!(
        debug.stderr.contains("analysis complete"),
        "log: {}",
        debug.log_path.display()
    );
}

#[test]
fn missing_responses_file_is_a_runtime_error() {
    let result = common::run_cli_case(
        "analyze_missing_file",
        &["analyze", "--responses", "/nonexistent/iinv/session.json"],
    );
    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("INV-3002"));
}

#[test]
fn unsupported_bank_format_is_a_user_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bank = dir.path().join("bank.csv");
    fs::write(&bank, "id,text\n").expect("write bank");
    let bank_arg = bank.to_string_lossy().to_string();
    let result = common::run_cli_case("form_bad_format", &["form", "--bank", &bank_arg]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("INV-2002"));
}

#[test]
fn config_validate_reports_hash_and_rejects_bad_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let good = dir.path().join("good.toml");
    fs::write(&good, "[sampler]\nmeta_interval = 10\n").expect("write config");
    let good_arg = good.to_string_lossy().to_string();
    let result = common::run_cli_case("config_validate_good", &["--config", &good_arg, "config", "validate"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["valid"], true);
    assert_eq!(payload["hash"].as_str().map(str::len), Some(16));

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[sampler]\nmeta_interval = 0\n").expect("write config");
    let bad_arg = bad.to_string_lossy().to_string();
    let result = common::run_cli_case("config_validate_bad", &["--config", &bad_arg, "config", "validate"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["code"], "INV-1001");
}
