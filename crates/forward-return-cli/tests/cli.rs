use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn fwdret() -> Command {
    let mut cmd = Command::cargo_bin("fwdret").expect("binary exists");
    cmd.env_remove("FWDRET_TODAY").env_remove("FWDRET_OUTPUT");
    cmd
}

#[test]
fn cli_help_runs() {
    fwdret().arg("--help").assert().success();
}

#[test]
fn forward_return_from_flags() {
    fwdret()
        .args([
            "forward-return",
            "--price",
            "100",
            "--exit-multiple",
            "10",
            "--fiscal-year-end",
            "2020-12-31",
            "--estimate",
            "2031:12",
            "--estimate",
            "2032:13",
            "--today",
            "2026-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"computed\""))
        .stdout(predicate::str::contains("\"future_price\": \"120"));
}

#[test]
fn forward_return_reports_missing_year() {
    fwdret()
        .args([
            "forward-return",
            "--price",
            "100",
            "--exit-multiple",
            "10",
            "--fiscal-year-end",
            "2020-12-31",
            "--estimate",
            "2031:12",
            "--today",
            "2026-01-01",
            "--output",
            "minimal",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Metric estimate for FY2032 is required"));
}

#[test]
fn today_can_come_from_environment() {
    fwdret()
        .env("FWDRET_TODAY", "2026-01-01")
        .args(["fiscal", "--fiscal-year-end", "2019-06-30", "--output", "minimal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fiscal_year: 2026"));
}

#[test]
fn screen_reads_input_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[
            {{"ticker": "AAA", "current_price": 100, "exit_multiple": 15,
              "fiscal_year_end_date": "2020-12-31",
              "estimates": [{{"fiscal_year": 2031, "metric_value": 8}}, {{"fiscal_year": 2032, "metric_value": 8}}]}},
            {{"ticker": "BBB", "current_price": 100, "exit_multiple": 15,
              "fiscal_year_end_date": "2020-12-31", "estimates": []}}
        ]"#
    )
    .unwrap();

    fwdret()
        .args(["screen", "--today", "2026-01-01", "--output", "csv", "--input"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("AAA"))
        .stdout(predicate::str::contains("insufficient_data"));
}

#[test]
fn invalid_today_environment_fails() {
    fwdret()
        .env("FWDRET_TODAY", "yesterday")
        .args(["fiscal", "--fiscal-year-end", "2019-06-30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FWDRET_TODAY"));
}
