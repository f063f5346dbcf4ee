use std::process::{Command, Output};

fn tradedash(args: &[&str]) -> Output {
    let binary_path = env!("CARGO_BIN_EXE_tradedash");

    Command::new(binary_path)
        .args(["--log-level", "error"])
        .args(args)
        .env_remove("TRADEDASH_DATA_SOURCE")
        .output()
        .expect("Failed to start tradedash binary")
}

fn describe(output: &Output) -> String {
    format!(
        "status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn help_lists_commands() {
    let output = tradedash(&["--help"]);

    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("stop"));
}

#[test]
fn demo_status_is_tagged() {
    let output = tradedash(&["--demo", "status"]);

    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[DEMO]"), "{}", describe(&output));
    assert!(stdout.contains("demo-wallet"), "{}", describe(&output));
}

#[test]
fn demo_config_prints_effective_settings() {
    let output = tradedash(&["--demo", "config"]);

    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("data_source: demo"), "{}", describe(&output));
}

#[test]
fn invalid_start_fails_before_any_request() {
    let output = tradedash(&["--demo", "start", "--max-amount", "0"]);

    assert!(!output.status.success(), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("max_amount must be greater than zero"),
        "{}",
        describe(&output)
    );
}

#[test]
fn demo_stop_needs_running_bot_and_start_succeeds() {
    // Each invocation gets a fresh simulated backend, so a stop alone is rejected
    let output = tradedash(&["--demo", "stop"]);
    assert!(!output.status.success(), "{}", describe(&output));

    let output = tradedash(&["--demo", "start", "--max-amount", "50"]);
    assert!(output.status.success(), "{}", describe(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("[DEMO]"));
}
