use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

/// プラットフォーム固有の問い合わせ1件。外部コマンド、またはネイティブな
/// ファイル読み取り。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeSpec {
    Command { program: String, args: Vec<String> },
    File { path: PathBuf },
}

impl ProbeSpec {
    pub fn command(program: impl Into<String>, args: &[&str]) -> Self {
        ProbeSpec::Command {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ProbeSpec::File { path: path.into() }
    }

    pub fn describe(&self) -> String {
        match self {
            ProbeSpec::Command { program, args } => {
                if args.is_empty() {
                    program.clone()
                } else {
                    format!("{program} {}", args.join(" "))
                }
            }
            ProbeSpec::File { path } => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success(String),
    NonZeroExit { code: i32, output: String },
    NotFound,
    PermissionDenied,
    TimedOut,
}

/// プローブを実行して結果を分類する。`timeout` を超えてブロックしない。
/// タイムアウト予算が尽きている場合は起動せず `TimedOut` を返す。
pub fn run(spec: &ProbeSpec, timeout: Duration) -> ExecutionOutcome {
    if timeout.is_zero() {
        return ExecutionOutcome::TimedOut;
    }

    match spec {
        ProbeSpec::Command { program, args } => run_command(program, args, timeout),
        ProbeSpec::File { path } => read_file(path),
    }
}

fn run_command(program: &str, args: &[String], timeout: Duration) -> ExecutionOutcome {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => return classify_io_error(&err),
    };

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            // 子プロセスを残さない: kill して回収してから返す。
            let _ = child.kill();
            let _ = child.wait();
            return ExecutionOutcome::TimedOut;
        }
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            return classify_io_error(&err);
        }
    };

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        let _ = out.read_to_string(&mut stdout);
    }
    let mut stderr = String::new();
    if let Some(mut err) = child.stderr.take() {
        let _ = err.read_to_string(&mut stderr);
    }

    let code = status.code().unwrap_or(-1);
    if code == 0 {
        ExecutionOutcome::Success(stdout)
    } else {
        let output = if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        };
        ExecutionOutcome::NonZeroExit { code, output }
    }
}

fn read_file(path: &std::path::Path) -> ExecutionOutcome {
    match std::fs::read_to_string(path) {
        Ok(raw) => ExecutionOutcome::Success(raw),
        Err(err) => classify_io_error(&err),
    }
}

fn classify_io_error(err: &std::io::Error) -> ExecutionOutcome {
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => ExecutionOutcome::PermissionDenied,
        // 起動も読み取りもできないツールは欠落として扱う。
        _ => ExecutionOutcome::NotFound,
    }
}
