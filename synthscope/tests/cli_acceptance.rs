use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

struct CliTestEnv {
    temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_frames(&self, frames: &[&str]) -> PathBuf {
        let path = self.temp_dir.path().join("frames.jsonl");
        fs::write(&path, frames.join("\n")).expect("failed to write frames");
        path
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("synthscope");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(assert_cmd::cargo::cargo_bin!("synthscope"));
        command
            .args(args)
            .env("HOME", &self.home)
            .env("XDG_CONFIG_HOME", &self.xdg_config)
            .env("XDG_STATE_HOME", &self.xdg_state)
            .env_remove("RUST_LOG");
        command
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    env.command(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute synthscope: {e}"))
}

fn run_with_stdin(env: &CliTestEnv, args: &[&str], stdin: &str) -> Output {
    let mut child = env
        .command(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to spawn synthscope: {e}"));

    child
        .stdin
        .take()
        .expect("stdin not piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");

    child
        .wait_with_output()
        .expect("failed to wait for synthscope")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "synthscope {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

const FRAMES: &[&str] = &[
    r#"{"kind":"generation_update","data":{"message":"Starting pipeline","step":"Initialization","progress":5}}"#,
    "[40%] Domain Analysis: scanning columns",
    "✅ Privacy Agent: privacy score 0.92",
    "Error: connection refused",
    "{\"kind\": ",
];

#[test]
fn classify_reports_pattern_and_fields() {
    let env = CliTestEnv::new();
    let args = ["classify", "[40%] Domain Analysis: scanning columns"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("classify output should be JSON");
    assert_eq!(json["pattern"], "bracketed_progress");
    assert_eq!(json["normalized"]["step"], "Domain Analysis");
    assert_eq!(json["activity"]["message"], "scanning columns");
    assert_eq!(json["activity"]["progress"], 40);
    assert_eq!(json["activity"]["type"], "domain_analysis");
}

#[test]
fn replay_prints_newest_first_with_gauge() {
    let env = CliTestEnv::new();
    let frames = env.write_frames(FRAMES);
    let frames_arg = frames.to_string_lossy().into_owned();
    let args = ["replay", frames_arg.as_str()];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parse_failure = stdout
        .find("Failed to parse activity event")
        .expect("parse failure record missing");
    let first = stdout
        .find("Starting pipeline")
        .expect("first record missing");
    assert!(parse_failure < first, "expected newest first:\n{stdout}");
    assert!(stdout.contains("Records: 5"), "summary missing:\n{stdout}");
    assert!(stdout.contains("40%"), "gauge missing:\n{stdout}");
    assert!(
        env.xdg_state.join("synthscope").exists(),
        "log directory should be created"
    );
}

#[test]
fn replay_json_applies_filters() {
    let env = CliTestEnv::new();
    let frames = env.write_frames(FRAMES);
    let frames_arg = frames.to_string_lossy().into_owned();
    let args = [
        "replay",
        frames_arg.as_str(),
        "--agent",
        "Privacy Agent",
        "--search",
        "score",
        "--json",
    ];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("replay output should be JSON");
    let records = json["records"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["agent"], "Privacy Agent");
    assert_eq!(records[0]["level"], "success");
    assert_eq!(json["progress"], 40);
    assert_eq!(json["summary"]["total"], 5);
    assert_eq!(json["summary"]["error"], 2);
}

#[test]
fn replay_rejects_capacity_out_of_range() {
    let env = CliTestEnv::new();
    let frames = env.write_frames(FRAMES);
    let frames_arg = frames.to_string_lossy().into_owned();

    let output = run_bin(&env, &["replay", frames_arg.as_str(), "--capacity", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("capacity"), "unexpected stderr:\n{stderr}");
}

#[test]
fn replay_respects_configured_capacity() {
    let env = CliTestEnv::new();
    env.write_config("[monitor]\ncapacity = 2\n");
    let frames = env.write_frames(FRAMES);
    let frames_arg = frames.to_string_lossy().into_owned();
    let args = ["replay", frames_arg.as_str(), "--json"];

    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("replay output should be JSON");
    let records = json["records"].as_array().expect("records array");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["message"], "connection refused");
}

#[test]
fn watch_streams_stdin_until_eof() {
    let env = CliTestEnv::new();
    let args = ["watch", "--level", "error"];

    let output = run_with_stdin(&env, &args, &FRAMES.join("\n"));
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ERROR"), "expected error records:\n{stdout}");
    assert!(stdout.contains("connection refused"));
    assert!(!stdout.contains("scanning columns"));
    assert!(stdout.contains("Records: 5"), "summary missing:\n{stdout}");
}

#[test]
fn status_without_backend_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["status"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no backend configured"),
        "unexpected stderr:\n{stderr}"
    );
}
