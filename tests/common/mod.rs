#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use integrity_inventory::bank::item::{ItemDefinition, MetaSubtype};

pub const TRAITS: [&str; 6] = [
    "honesty_humility",
    "emotionality",
    "extraversion",
    "agreeableness",
    "conscientiousness",
    "openness",
];

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_iinv") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "iinv.exe" } else { "iinv" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve iinv binary path for integration test"),
    }
}

/// Run the binary with JSON output forced through the environment and a
/// config path that never exists, so the host's config cannot leak in.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

/// Like [`run_cli_case`], with extra environment variables applied last.
pub fn run_cli_case_with_env(case_name: &str, args: &[&str], envs: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("iinv-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let output = Command::new(&bin_path)
        .args(args)
        .env("IINV_OUTPUT_FORMAT", "json")
        .env("HOME", &root)
        .env_remove("IINV_LOG")
        .env("RUST_BACKTRACE", "1")
        .envs(envs.iter().copied())
        .output()
        .expect("execute iinv command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    let _ = writeln!(log_content, "case={case_name}");
    let _ = writeln!(log_content, "bin={}", bin_path.display());
    let _ = writeln!(log_content, "args={args:?}");
    let _ = writeln!(log_content, "envs={envs:?}");
    let _ = writeln!(log_content, "status={}", output.status);
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Six HEXACO traits with `per_trait` items each (alternating reverse coding),
/// three main-control rewordings, and `meta_per_subtype` items per meta subtype.
pub fn hexaco_bank(per_trait: usize, meta_per_subtype: usize) -> Vec<ItemDefinition> {
    let mut items = Vec::new();
    for name in TRAITS {
        for n in 0..per_trait {
            items.push(ItemDefinition::regular(
                format!("{name}-{n:02}"),
                format!("{name} statement {n}"),
                name,
                n % 2 == 1,
            ));
        }
    }
    for n in 0..3 {
        items.push(ItemDefinition::main_control(
            format!("control-{n}"),
            format!("I have never taken something that was not mine ({n})"),
            "control",
            false,
        ));
    }
    for subtype in MetaSubtype::ALL {
        for n in 0..meta_per_subtype {
            items.push(ItemDefinition::meta(
                format!("{subtype}-{n}"),
                format!("{subtype} probe {n}"),
                subtype,
            ));
        }
    }
    items
}

/// Write `items` as a TOML `[[items]]` bank file.
pub fn write_bank(dir: &Path, items: &[ItemDefinition]) -> PathBuf {
    #[derive(serde::Serialize)]
    struct Document<'a> {
        items: &'a [ItemDefinition],
    }
    let path = dir.join("bank.toml");
    let body = toml::to_string(&Document { items }).expect("serialize bank");
    fs::write(&path, body).expect("write bank");
    path
}
