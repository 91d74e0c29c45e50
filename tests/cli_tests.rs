// End-to-end tests for the register binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a temporary database and set it as the data location
fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_dir = temp_dir.path().join(".register");
    fs::create_dir_all(&config_dir).unwrap();
    let config_file = config_dir.join("rc");
    fs::write(&config_file, format!("data.location={}\npage.size=3\n", db_path.display())).unwrap();
    (temp_dir, guard)
}

/// Helper to create a new command with test environment
fn new_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("register").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd.env_remove("REGISTER_PRINCIPAL");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn add_news(temp_dir: &TempDir, principal: &str, subject: &str) {
    new_cmd(temp_dir)
        .args(["--as", principal, "news", "add", "--subject", subject, "--text", "body"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created news"));
}

#[test]
fn test_parse_prints_postfix() {
    let (temp_dir, _guard) = setup_test_env();
    new_cmd(&temp_dir)
        .args(["parse", "a:1", "OR", "b:2", "AND", "c:3"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)^a .*\nb .*\nc .*\nAND\nOR\n$").unwrap());
}

#[test]
fn test_parse_json() {
    let (temp_dir, _guard) = setup_test_env();
    let output = new_cmd(&temp_dir)
        .args(["parse", "--json", "name:Jo*"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["key"], "name");
    assert_eq!(json[0]["operation"], "STARTS_WITH");
    assert_eq!(json[0]["value"], "Jo");
}

#[test]
fn test_news_visible_to_creator_only() {
    let (temp_dir, _guard) = setup_test_env();
    add_news(&temp_dir, "alice", "Premiere");

    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Premiere"))
        .stdout(predicate::str::contains("(1 total)"));

    new_cmd(&temp_dir)
        .args(["news", "list", "--as", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No news found."))
        .stdout(predicate::str::contains("(0 total)"));
}

#[test]
fn test_principal_from_env() {
    let (temp_dir, _guard) = setup_test_env();
    add_news(&temp_dir, "alice", "Premiere");

    new_cmd(&temp_dir)
        .env("REGISTER_PRINCIPAL", "alice")
        .args(["news", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Premiere"));
}

#[test]
fn test_anonymous_list_is_internal_error() {
    let (temp_dir, _guard) = setup_test_env();
    new_cmd(&temp_dir)
        .args(["news", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("anonymous"));
}

#[test]
fn test_grant_and_revoke() {
    let (temp_dir, _guard) = setup_test_env();
    add_news(&temp_dir, "alice", "Shared");

    new_cmd(&temp_dir)
        .args(["grant", "news", "1", "bob", "read"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Granted READ on News 1 to bob"));

    new_cmd(&temp_dir)
        .args(["--as", "bob", "news", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Shared"));

    new_cmd(&temp_dir)
        .args(["revoke", "news", "1", "bob", "read"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["--as", "bob", "news", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No news found."));
}

#[test]
fn test_grant_errors_are_user_errors() {
    let (temp_dir, _guard) = setup_test_env();

    new_cmd(&temp_dir)
        .args(["grant", "spex", "1", "bob", "read"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown entity type"));

    new_cmd(&temp_dir)
        .args(["grant", "news", "1", "bob", "fly"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown permission"));

    new_cmd(&temp_dir)
        .args(["grant", "news", "99", "bob", "read"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("News 99 not found"));
}

#[test]
fn test_list_filter_and_paging() {
    let (temp_dir, _guard) = setup_test_env();
    for subject in ["Alpha", "Beta", "Gamma", "Delta", "Epsilon"] {
        add_news(&temp_dir, "alice", subject);
    }

    // page.size=3 from the rc file
    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list", "--page", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Delta"))
        .stdout(predicate::str::contains("Epsilon"))
        .stdout(predicate::str::contains("Alpha").not())
        .stdout(predicate::str::contains("Page 2 of 2 (5 total)"));

    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list", "--filter", "subject:*lph* OR subject:Beta"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alpha"))
        .stdout(predicate::str::contains("Beta"))
        .stdout(predicate::str::contains("Gamma").not());
}

#[test]
fn test_list_sorted_json() {
    let (temp_dir, _guard) = setup_test_env();
    for subject in ["b", "c", "a"] {
        add_news(&temp_dir, "alice", subject);
    }

    let output = new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list", "--sort", "subject,desc", "--size", "10", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let subjects: Vec<&str> = json["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["subject"].as_str().unwrap())
        .collect();
    assert_eq!(subjects, vec!["c", "b", "a"]);
    assert_eq!(json["totalElements"], 3);
    assert_eq!(json["content"][0]["createdBy"], "alice");
}

#[test]
fn test_out_of_range_page_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    add_news(&temp_dir, "alice", "Only");

    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list", "--page", "18446744073709551615"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value"))
        .stdout(predicate::str::contains("Only").not());
}

#[test]
fn test_config_warnings_are_logged() {
    let (temp_dir, _guard) = setup_test_env();
    let rc = temp_dir.path().join(".register").join("rc");
    fs::write(&rc, "page.size=lots\nnonsense\n").unwrap();

    new_cmd(&temp_dir)
        .args(["parse", "a:1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid page.size 'lots'"))
        .stderr(predicate::str::contains("Ignoring malformed config line: nonsense"));
}

#[test]
fn test_unknown_sort_property() {
    let (temp_dir, _guard) = setup_test_env();
    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "list", "--sort", "bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown sort property 'bogus'"));
}

#[test]
fn test_invalid_date_rejected() {
    let (temp_dir, _guard) = setup_test_env();
    new_cmd(&temp_dir)
        .args(["--as", "alice", "news", "add", "--subject", "S", "--text", "T", "--visible-from", "tomorrow"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("visibleFrom"));
}

#[test]
fn test_tags() {
    let (temp_dir, _guard) = setup_test_env();
    new_cmd(&temp_dir)
        .args(["--as", "alice", "tag", "add", "--name", "musical", "--description", "Sung"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created tag 'musical' (id: 1)"));
    new_cmd(&temp_dir)
        .args(["--as", "alice", "tag", "add", "--name", "revue"])
        .assert()
        .success();

    new_cmd(&temp_dir)
        .args(["--as", "alice", "tag", "list", "--filter", "name:mus*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("musical"))
        .stdout(predicate::str::contains("revue").not());
}
