use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cmd() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("promptpack").unwrap()
}

/// A course-chat prompt: fixed instructions, a truncatable recap, and history.
const CHAT_PROMPT: &str = r#"{
    "parts": [
        { "role": "system", "text": "You are a helpful, patient and insightful teacher.", "priority": 100 },
        { "role": "system", "text": "So far the course has covered: variables, loops, functions, closures, iterators, traits, generics, lifetimes", "priority": 80, "truncate_to": 30 },
        { "role": "system", "text": "Conversation:", "priority": 100 }
    ],
    "history": [
        { "role": "user", "content": "What is a variable?" },
        { "role": "user", "content": "And a loop?" },
        { "role": "user", "content": "How do closures capture?" },
        { "role": "assistant", "content": "By reference, mutable reference, or by value." },
        { "role": "user", "content": "Show me an example." }
    ]
}"#;

fn write_prompt(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// -----------------------------------------------------------------------
// General CLI tests
// -----------------------------------------------------------------------

#[test]
fn help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("pack"))
        .stdout(predicate::str::contains("explain"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn unknown_command_fails() {
    cmd().arg("collect").assert().failure();
}

// -----------------------------------------------------------------------
// Init command tests
// -----------------------------------------------------------------------

#[test]
fn init_creates_config() {
    let dir = tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));

    let content = std::fs::read_to_string(dir.path().join("promptpack.toml")).unwrap();
    assert!(content.contains("chars_per_token"));
    assert!(content.contains("[Older messages hidden]"));
}

#[test]
fn init_errors_on_existing_without_force() {
    let dir = tempdir().unwrap();
    cmd().current_dir(dir.path()).arg("init").assert().success();

    cmd()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cmd()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overwrote config"));
}

// -----------------------------------------------------------------------
// Pack command tests
// -----------------------------------------------------------------------

#[test]
fn pack_with_room_keeps_everything_in_order() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);

    let output = cmd()
        .current_dir(dir.path())
        .args(["pack", input.to_str().unwrap(), "--budget", "10000", "--stdout"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let messages = parsed.as_array().unwrap();
    assert_eq!(messages.len(), 8);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[2]["content"], "Conversation:");
    assert_eq!(messages[7]["content"], "Show me an example.");
}

#[test]
fn pack_tight_budget_hides_older_messages() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);

    let output = cmd()
        .current_dir(dir.path())
        .args(["pack", input.to_str().unwrap(), "--budget", "60", "--stdout"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let contents: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();

    // The two oldest user turns collapse into one placeholder.
    assert_eq!(
        contents
            .iter()
            .filter(|c| **c == "[Older messages hidden]")
            .count(),
        1
    );
    assert!(contents[1].ends_with("..."));
    assert_eq!(contents.last(), Some(&"Show me an example."));
    assert!(!contents.contains(&"What is a variable?"));
}

#[test]
fn pack_over_budget_still_succeeds_with_warning() {
    let dir = tempdir().unwrap();
    let input = write_prompt(
        dir.path(),
        "fixed.json",
        r#"{ "parts": [ { "role": "system", "text": "This instruction can never be shortened or dropped." } ] }"#,
    );

    cmd()
        .current_dir(dir.path())
        .args(["pack", input.to_str().unwrap(), "--budget", "3", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("can never be shortened"))
        .stderr(predicate::str::contains("over budget"));
}

#[test]
fn pack_writes_file_and_report() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);
    let out = dir.path().join("build").join("packed.md");

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--budget",
            "60",
            "--format",
            "markdown",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("report written"));

    let packed = std::fs::read_to_string(&out).unwrap();
    assert!(packed.contains("### system"));
    let report = dir.path().join("build").join("packed.report.json");
    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(parsed["summary"]["budget"], 60);
    assert_eq!(parsed["entries"].as_array().unwrap().len(), 8);
}

#[test]
fn pack_transcript_as_plain() {
    let dir = tempdir().unwrap();
    let input = write_prompt(
        dir.path(),
        "chat.txt",
        "System: Be brief.\nUser: hi\nAssistant: hello!",
    );

    cmd()
        .current_dir(dir.path())
        .args(["pack", input.to_str().unwrap(), "--format", "plain", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "system: Be brief.\n\nuser: hi\n\nassistant: hello!\n",
        ));
}

#[test]
fn pack_reserve_uses_config_budget() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("promptpack.toml"),
        "default_budget = 100\nreserve_tokens = 40\n",
    )
    .unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);
    let report = dir.path().join("r.json");

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--stdout",
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(parsed["summary"]["budget"], 60);
}

#[test]
fn pack_missing_input_fails() {
    let dir = tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["pack", "nope.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn pack_invalid_json_fails() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "bad.json", "{ not json");
    cmd()
        .current_dir(dir.path())
        .args(["pack", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn pack_non_finite_priority_fails_before_packing() {
    let dir = tempdir().unwrap();
    let input = write_prompt(
        dir.path(),
        "nan.toml",
        "[[parts]]\nrole = \"user\"\ntext = \"x\"\npriority = nan\n",
    );
    let out = dir.path().join("packed.json");

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("parts[0].priority"));

    assert!(!dir.path().join("packed.report.json").exists());
}

#[test]
fn pack_tiny_ratio_does_not_panic() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--chars-per-token",
            "1e-18",
            "--stdout",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("over budget"));
}

#[test]
fn pack_bad_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "default_budget = 0\n").unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("default_budget"));
}

// -----------------------------------------------------------------------
// Explain and stats command tests
// -----------------------------------------------------------------------

#[test]
fn explain_reads_report() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);
    let report = dir.path().join("chat.report.json");

    cmd()
        .current_dir(dir.path())
        .args([
            "pack",
            input.to_str().unwrap(),
            "--budget",
            "60",
            "--stdout",
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success();

    cmd()
        .current_dir(dir.path())
        .args(["--color", "never", "explain", report.to_str().unwrap(), "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("truncated"))
        .stdout(predicate::str::contains("deduped"))
        .stdout(predicate::str::contains("budget"));
}

#[test]
fn stats_lists_parts() {
    let dir = tempdir().unwrap();
    let input = write_prompt(dir.path(), "chat.json", CHAT_PROMPT);

    cmd()
        .current_dir(dir.path())
        .args(["--color", "never", "stats", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("parts:           8"))
        .stdout(predicate::str::contains("truncate to 30"))
        .stdout(predicate::str::contains("[Older messages hidden]"));
}
