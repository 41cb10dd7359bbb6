use std::{env, process::Command};

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let commit = command_output("git", &["rev-parse", "--short", "HEAD"])
        .filter(|hash| !hash.is_empty());
    let tree = command_output("git", &["status", "--porcelain"]).map(|status| {
        if status.is_empty() {
            "clean".to_string()
        } else {
            "dirty".to_string()
        }
    });
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".into());

    emit("HASH", commit);
    emit("STATUS", tree);
    emit("RUSTC", command_output(&rustc, &["--version"]));
    emit("PROFILE", env::var("PROFILE").ok());
    emit(
        "TIMESTAMP",
        Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
    );
}

fn emit(key: &str, value: Option<String>) {
    let value = value.unwrap_or_else(|| UNKNOWN.to_string());
    println!("cargo:rustc-env=BUDGET_LEDGER_BUILD_{key}={value}");
}

/// Trimmed stdout of a successful command. `git status` may legitimately
/// print nothing, so emptiness is left to the caller.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
