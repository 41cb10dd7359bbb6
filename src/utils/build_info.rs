//! Build metadata captured by `build.rs`.

use once_cell::sync::Lazy;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

static SUMMARY: Lazy<String> = Lazy::new(|| {
    let info = current();
    format!(
        "budget_ledger {} ({} {}, {})",
        info.version, info.git_hash, info.git_status, info.profile
    )
});

pub fn current() -> BuildInfo {
    BuildInfo {
        version: CLI_VERSION,
        git_hash: env!("BUDGET_LEDGER_BUILD_HASH"),
        git_status: env!("BUDGET_LEDGER_BUILD_STATUS"),
        timestamp: env!("BUDGET_LEDGER_BUILD_TIMESTAMP"),
        profile: env!("BUDGET_LEDGER_BUILD_PROFILE"),
        rustc: env!("BUDGET_LEDGER_BUILD_RUSTC"),
    }
}

/// One-line version string, e.g. `budget_ledger 0.0.1 (a1b2c3d clean, debug)`.
pub fn summary() -> &'static str {
    &SUMMARY
}
