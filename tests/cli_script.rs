mod common;

use assert_cmd::Command;
use predicates::str::contains;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("budget_ledger_cli").unwrap();
    cmd.env("BUDGET_LEDGER_HOME", home)
        .env("BUDGET_LEDGER_CLI_SCRIPT", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_records_and_persists_a_month() {
    let home = common::temp_dir();
    let input = "month 2024-05\n\
                 income Salary 2000\n\
                 budget Food 250 Living\n\
                 add 12.50 \"Tesco Metro\" --category Food --date 2024-05-03\n\
                 show\n\
                 exit\n";

    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Active month is now 2024-05"))
        .stdout(contains("Tesco Metro"))
        .stdout(contains("Leftover : £1987.50"));

    let json = std::fs::read_to_string(home.join("budget.json")).unwrap();
    assert!(json.contains("\"2024-05\""));
    assert!(json.contains("Tesco Metro"));

    cli(&home)
        .write_stdin("suggest tes\nexit\n")
        .assert()
        .success()
        .stdout(contains("Tesco Metro"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = common::temp_dir();
    cli(&home)
        .write_stdin("shwo\n")
        .assert()
        .success()
        .stdout(contains("Suggestion: `show`?"));
}

#[test]
fn failing_script_lines_fail_the_run() {
    let home = common::temp_dir();
    cli(&home)
        .write_stdin("income Salary lots\nincome Salary 10\n")
        .assert()
        .failure()
        .stdout(contains("line 1: income Salary lots"))
        .stderr(contains("1 script line(s) failed: 1"));
}

#[test]
fn unexpected_arguments_are_rejected() {
    let home = common::temp_dir();
    cli(&home).arg("--bogus").assert().failure();
}

#[test]
fn version_flag_prints_build_summary() {
    let home = common::temp_dir();
    cli(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("budget_ledger 0.0.1"));
}
