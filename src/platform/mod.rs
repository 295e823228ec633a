use std::time::Duration;

use crate::core::{Family, PlatformInfo};
use crate::probe::{self, ExecutionOutcome, ProbeSpec};

/// 実行中のOSを特定する。失敗しない: 特定できない場合は `Other` と
/// ベストエフォートの名前/バージョンで返し、後段は常に分岐材料を持つ。
pub fn resolve(timeout: Duration) -> PlatformInfo {
    #[cfg(target_os = "macos")]
    {
        return resolve_macos(timeout);
    }

    #[cfg(target_os = "linux")]
    {
        return resolve_linux(timeout);
    }

    #[cfg(target_os = "windows")]
    {
        return resolve_windows(timeout);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = timeout;
        PlatformInfo {
            family: Family::Other,
            os_name: std::env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
        }
    }
}

#[cfg(target_os = "macos")]
fn resolve_macos(timeout: Duration) -> PlatformInfo {
    let spec = ProbeSpec::command("sw_vers", &["-productVersion"]);
    let os_version = match probe::run(&spec, timeout) {
        ExecutionOutcome::Success(out) if !out.trim().is_empty() => out.trim().to_string(),
        _ => "unknown".to_string(),
    };
    PlatformInfo {
        family: Family::MacOs,
        os_name: "macOS".to_string(),
        os_version,
    }
}

#[cfg(target_os = "linux")]
fn resolve_linux(timeout: Duration) -> PlatformInfo {
    let spec = ProbeSpec::file("/etc/os-release");
    let (os_name, os_version) = match probe::run(&spec, timeout) {
        ExecutionOutcome::Success(raw) => parse_os_release(&raw),
        _ => (None, None),
    };
    PlatformInfo {
        family: Family::Linux,
        os_name: os_name.unwrap_or_else(|| "Linux".to_string()),
        os_version: os_version.unwrap_or_else(|| "unknown".to_string()),
    }
}

#[cfg(target_os = "windows")]
fn resolve_windows(timeout: Duration) -> PlatformInfo {
    let spec = ProbeSpec::command("cmd", &["/C", "ver"]);
    let os_version = match probe::run(&spec, timeout) {
        ExecutionOutcome::Success(out) => {
            parse_windows_ver(&out).unwrap_or_else(|| "unknown".to_string())
        }
        _ => "unknown".to_string(),
    };
    PlatformInfo {
        family: Family::Windows,
        os_name: "Windows".to_string(),
        os_version,
    }
}

/// `/etc/os-release` から (NAME, VERSION_ID) を取り出す。
/// 表示名は PRETTY_NAME よりも NAME を優先する（バージョンは別フィールド）。
fn parse_os_release(raw: &str) -> (Option<String>, Option<String>) {
    let mut name = None;
    let mut pretty_name = None;
    let mut version_id = None;

    for line in raw.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("NAME=") {
            name = non_empty(value.trim_matches('"'));
        } else if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            pretty_name = non_empty(value.trim_matches('"'));
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version_id = non_empty(value.trim_matches('"'));
        }
    }

    (name.or(pretty_name), version_id)
}

/// `cmd /C ver` の出力（例: `Microsoft Windows [Version 10.0.22631.3447]`）
/// からバージョン番号を取り出す。
fn parse_windows_ver(raw: &str) -> Option<String> {
    let start = raw.find("[Version ")?;
    let rest = &raw[start + "[Version ".len()..];
    let end = rest.find(']')?;
    non_empty(&rest[..end])
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
