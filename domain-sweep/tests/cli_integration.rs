// domain-sweep/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "DS_CONFIG",
    "DS_CONCURRENCY",
    "DS_RETRIES",
    "DS_TIMEOUT",
    "DS_DELAY",
    "DS_PRIMARY",
    "DS_FALLBACK",
    "DS_PRIMARY_URL",
    "DS_FALLBACK_URL",
    "DS_WHOIS_BIN",
    "DS_API_KEY",
    "DS_LENGTH",
    "DS_DIGITS",
    "DS_OUTPUT",
    "RUST_LOG",
];

/// Command isolated from the user's config files and environment.
fn sweep_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("domain-sweep").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

/// Offline flags: the whois source is a local binary and there is no fallback.
fn offline_args<'a>(whois_bin: &'a str, output: &'a str) -> Vec<&'a str> {
    vec![
        "--primary",
        "whois",
        "--whois-bin",
        whois_bin,
        "--fallback",
        "none",
        "--alphabet",
        "a",
        "--length",
        "1",
        "--timeout",
        "5s",
        "--output",
        output,
        "im",
    ]
}

#[test]
fn test_help_shows_flags() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--suffix-file"))
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--fallback"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_suffix_fails() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one suffix"));
}

#[test]
fn test_invalid_concurrency_fails() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .args(["im", "--concurrency", "0", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency must be between 1 and 100"));
}

#[test]
fn test_dry_run_lists_candidates() {
    let home = TempDir::new().unwrap();
    let output = sweep_cmd(home.path())
        .args(["im", "--length", "1", "--dry-run"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 36);
    assert_eq!(lines[0], "0.im");
    assert_eq!(lines[35], "z.im");
    assert!(String::from_utf8_lossy(&output.stderr).contains("36 domains would be checked"));
}

#[test]
fn test_dry_run_json_letters_only() {
    let home = TempDir::new().unwrap();
    let output = sweep_cmd(home.path())
        .args(["io", "--length", "1", "--no-digits", "--dry-run", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let domains: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(domains.len(), 26);
    assert_eq!(domains[0], "a.io");
}

#[test]
fn test_dry_run_keeps_suffix_order() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .args(["im", ".io", "--alphabet", "ab", "--length", "2", "--dry-run"])
        .assert()
        .success()
        .stdout("aa.im\nab.im\nba.im\nbb.im\naa.io\nab.io\nba.io\nbb.io\n");
}

#[test]
fn test_suffix_file_filters_long_entries() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("tlds.txt");
    fs::write(&file, "# short ones\nim\n.io\ncom\nonline\n").unwrap();

    sweep_cmd(home.path())
        .args(["--alphabet", "a", "--length", "1", "--dry-run", "--suffix-file"])
        .arg(&file)
        .assert()
        .success()
        .stdout("a.im\na.io\na.com\n");
}

#[test]
fn test_config_file_is_used() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("domain-sweep.toml"),
        "[generation]\nalphabet = \"xy\"\nlength = 1\n",
    )
    .unwrap();

    sweep_cmd(home.path())
        .args(["im", "--dry-run"])
        .assert()
        .success()
        .stdout("x.im\ny.im\n");
}

#[test]
fn test_cli_overrides_environment() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .env("DS_LENGTH", "3")
        .args(["im", "--alphabet", "a", "--length", "1", "--dry-run"])
        .assert()
        .success()
        .stdout("a.im\n");
}

#[test]
fn test_invalid_url_is_config_error() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .args(["im", "--primary-url", "ftp://example.com", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_oversized_run_rejected_before_generation() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .args(["im", "--length", "6", "--yes"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the limit"));

    assert!(!home.path().join("output").exists());
}

#[test]
fn test_invalid_timeout_fails() {
    let home = TempDir::new().unwrap();
    sweep_cmd(home.path())
        .args(["im", "--timeout", "later", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --timeout"));
}

#[cfg(unix)]
#[test]
fn test_offline_sweep_writes_registered() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let out_str = out.to_str().unwrap();

    sweep_cmd(home.path())
        .args(offline_args("echo", out_str))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 taken"));

    assert_eq!(fs::read_to_string(out.join("input.txt")).unwrap(), "a.im\n");
    assert_eq!(fs::read_to_string(out.join("registered.txt")).unwrap(), "a.im\n");
    assert_eq!(fs::read_to_string(out.join("domain.txt")).unwrap(), "");
    assert_eq!(fs::read_to_string(out.join("error.txt")).unwrap(), "");
    assert!(out.join("domains-im-1.md").exists());
}

#[cfg(unix)]
#[test]
fn test_offline_sweep_reports_failures() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("out");
    let out_str = out.to_str().unwrap();

    let mut args = offline_args("false", out_str);
    args.extend(["--retries", "0", "--json"]);

    let output = sweep_cmd(home.path()).args(args).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["failed"], serde_json::json!(["a.im"]));
    assert_eq!(report["passes"], 1);
    assert_eq!(report["exhausted"], true);
    assert_eq!(fs::read_to_string(out.join("error.txt")).unwrap(), "a.im\n");
}
