//! E2E tests for the shopdir binary.
//!
//! Covers:
//! - JSON envelope on stdout and errors on stderr
//! - Exit codes for invalid input and missing data
//! - Session login/status/logout through the preference backend
//! - Home fetch against a mock server, then offline search over the cache

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::fixtures::home_json;
use common::logger::TestLogger;
use shopdir::core::home::HOME_PATH;

/// A `shopdir` invocation isolated to `home`: every platform directory and
/// configuration variable points inside it.
#[allow(deprecated)]
fn isolated(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shopdir").unwrap();
    let root = home.path();
    cmd.env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join("config"))
        .env("XDG_DATA_HOME", root.join("data"))
        .env("XDG_CACHE_HOME", root.join("cache"))
        .env("SHOPDIR_CONFIG", root.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("SHOPDIR_API_BASE_URL")
        .env_remove("SHOPDIR_REQUEST_TIMEOUT")
        .env_remove("SHOPDIR_MAX_RETRY_ATTEMPTS")
        .env_remove("SHOPDIR_ENABLE_LOGGING")
        .env_remove("SHOPDIR_TOKEN_BACKEND")
        .env_remove("SHOPDIR_LOG")
        .env_remove("SHOPDIR_LOG_FORMAT")
        .env_remove("SHOPDIR_LOG_FILE")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env("NO_PROXY", "127.0.0.1,localhost");
    cmd
}

/// [`isolated`] with tokens kept in the preference file.
fn shopdir(home: &TempDir) -> Command {
    let mut cmd = isolated(home);
    cmd.args(["--token-backend", "preferences"]);
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"))
}

#[test]
fn config_json_reports_defaults() {
    let log = TestLogger::new("config_json_reports_defaults");
    let home = TempDir::new().unwrap();

    log.phase("execute");
    let output = shopdir(&home).args(["config", "--json"]).output().unwrap();

    log.phase("verify");
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["schemaVersion"], "shopdir.v1");
    assert_eq!(json["command"], "config");
    assert_eq!(json["data"]["base_url"], "http://185.204.197.213:5906");
    assert_eq!(json["data"]["token_backend"], "preferences");
    log.finish_ok();
}

#[test]
fn config_reads_file_values() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[network]\nbase_url = \"https://api.example.com\"\n",
    )
    .unwrap();

    let output = shopdir(&home).args(["config", "--json"]).output().unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["data"]["base_url"], "https://api.example.com");
}

#[test]
fn history_list_starts_empty() {
    let home = TempDir::new().unwrap();

    let output = shopdir(&home).args(["history", "list", "--json"]).output().unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["command"], "history list");
    assert_eq!(json["data"], serde_json::json!([]));
}

#[test]
fn short_search_term_exits_with_parse_error() {
    let home = TempDir::new().unwrap();

    shopdir(&home)
        .args(["search", "ab", "--offline"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("at least 3 characters"));
}

#[test]
fn unknown_token_backend_is_rejected() {
    let home = TempDir::new().unwrap();

    isolated(&home)
        .args(["--token-backend", "floppy", "config"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("token_backend"));
}

#[test]
fn offline_home_without_cache_fails_with_json_error() {
    let home = TempDir::new().unwrap();

    let output = shopdir(&home)
        .args(["home", "--offline", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let envelope = stderr
        .lines()
        .find_map(|line| serde_json::from_str::<Value>(line).ok().filter(|v| v.get("schemaVersion").is_some()))
        .unwrap_or_else(|| panic!("no error envelope in stderr: {stderr}"));
    assert_eq!(envelope["data"]["exitCode"], 4);
}

#[test]
fn session_login_status_logout() {
    let log = TestLogger::new("session_login_status_logout");
    let home = TempDir::new().unwrap();

    log.phase("status before login");
    let output = shopdir(&home).args(["session", "status", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["data"]["loggedIn"], false);

    log.phase("login");
    shopdir(&home)
        .args(["session", "login", "--access-token", "abc", "--refresh-token", "def"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"));

    log.phase("status after login");
    let output = shopdir(&home).args(["session", "status", "--json"]).output().unwrap();
    let json = stdout_json(&output);
    assert_eq!(json["data"]["loggedIn"], true);
    assert_eq!(json["data"]["hasRefreshToken"], true);
    assert_eq!(json["data"]["tokenBackend"], "preferences");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("abc"));

    log.phase("logout");
    shopdir(&home).args(["session", "logout"]).assert().success();
    let output = shopdir(&home).args(["session", "status", "--json"]).output().unwrap();
    assert_eq!(stdout_json(&output)["data"]["loggedIn"], false);
    log.finish_ok();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn home_fetch_then_offline_search_and_history() {
    let log = TestLogger::new("home_fetch_then_offline_search_and_history");
    log.phase("setup");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HOME_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(home_json(&[
            ("shop-1", "Apple Store", &["Electronics"]),
            ("shop-2", "Banana Bakery", &["Food"]),
        ])))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    log.phase("fetch home");
    let output = shopdir(&home)
        .args(["--base-url", &server.uri(), "home", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["command"], "home");

    log.phase("offline search");
    let output = shopdir(&home)
        .args(["search", "apple", "--offline", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    let results = json["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Apple Store");

    log.phase("history");
    let output = shopdir(&home).args(["history", "list", "--json"]).output().unwrap();
    assert_eq!(stdout_json(&output)["data"][0]["term"], "apple");

    shopdir(&home)
        .args(["history", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 term."));
    log.finish_ok();
}
