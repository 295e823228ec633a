use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

fn guardpost_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_guardpost"));
    cmd.env("HOME", home);
    cmd.env_remove("GUARDPOST_CONFIG");
    cmd.env_remove("GUARDPOST_UI_COLOR");
    cmd.env_remove("GUARDPOST_PROBE_TIMEOUT_SECS");
    cmd.env_remove("GUARDPOST_REPORT_PRETTY");
    cmd.env_remove("GUARDPOST_ANTIVIRUS_EXTRA_PROCESSES");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    guardpost_cmd(home)
        .args(args)
        .output()
        .expect("run guardpost")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home =
        std::env::temp_dir().join(format!("guardpost-exit-test-{}-{seq}", std::process::id()));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

#[test]
fn completion_unknown_shell_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["completion", "nope"]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn completion_bash_succeeds() {
    let home = make_temp_home();
    let out = run(&home, &["completion", "bash"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(!out.stdout.is_empty());
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn zero_timeout_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["check", "--timeout", "0"]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn config_show_succeeds() {
    let home = make_temp_home();
    let out = run(&home, &["config", "--show"]);
    assert_eq!(out.status.code(), Some(0));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn broken_config_file_exits_2() {
    let home = make_temp_home();
    let path = home.join("config.toml");
    std::fs::write(&path, b"not [valid toml").expect("write config");
    let out = run(
        &home,
        &["--config", path.to_str().expect("utf8 path"), "config", "--show"],
    );
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}
