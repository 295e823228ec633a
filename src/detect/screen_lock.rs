use crate::core::{Detection, Family, ScreenLock, ScreenLockFinding, UnknownReason};
use crate::detect::{DetectorContext, unknown_for};
use crate::probe::{ExecutionOutcome, ProbeSpec};

/// 実効的なアイドルロック設定を読む。「ロック有効」フラグとタイムアウト秒の
/// 両方が解決できたときだけ `Detected`。設定済みでも無効化されていれば
/// `NotDetected`。ポリシー強制かユーザー設定かは区別しない（実効状態のみ）。
pub fn detect(ctx: &DetectorContext) -> ScreenLockFinding {
    match ctx.platform.family {
        Family::MacOs => detect_macos(ctx),
        Family::Linux => detect_linux(ctx),
        Family::Windows => detect_windows(ctx),
        Family::Other => Detection::Unknown(UnknownReason::PlatformUnsupported),
    }
}

fn detect_macos(ctx: &DetectorContext) -> ScreenLockFinding {
    let ask = ProbeSpec::command(
        "defaults",
        &["-currentHost", "read", "com.apple.screensaver", "askForPassword"],
    );
    let enabled = match ctx.run(&ask) {
        ExecutionOutcome::Success(out) => match out.trim() {
            "1" => true,
            "0" => false,
            _ => return Detection::Unknown(UnknownReason::ParseFailure),
        },
        // キー未設定で defaults は非ゼロ終了する = ロック未設定。
        ExecutionOutcome::NonZeroExit { .. } => false,
        outcome => {
            return Detection::Unknown(
                unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure),
            );
        }
    };

    if !enabled {
        return Detection::NotDetected;
    }

    let idle = ProbeSpec::command(
        "defaults",
        &["-currentHost", "read", "com.apple.screensaver", "idleTime"],
    );
    match ctx.run(&idle) {
        ExecutionOutcome::Success(out) => match out.trim().parse::<u64>() {
            Ok(seconds) => ScreenLock::detected(seconds),
            Err(_) => Detection::Unknown(UnknownReason::ParseFailure),
        },
        // ロック有効なのにタイムアウトが読めない = Detected の条件を満たさない。
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_linux(ctx: &DetectorContext) -> ScreenLockFinding {
    let lock = ProbeSpec::command(
        "gsettings",
        &["get", "org.gnome.desktop.screensaver", "lock-enabled"],
    );
    let enabled = match ctx.run(&lock) {
        ExecutionOutcome::Success(out) => match parse_gsettings_bool(&out) {
            Some(value) => value,
            None => return Detection::Unknown(UnknownReason::ParseFailure),
        },
        ExecutionOutcome::NonZeroExit { .. } => {
            return Detection::Unknown(UnknownReason::ParseFailure);
        }
        outcome => {
            return Detection::Unknown(
                unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure),
            );
        }
    };

    if !enabled {
        return Detection::NotDetected;
    }

    let delay = ProbeSpec::command(
        "gsettings",
        &["get", "org.gnome.desktop.session", "idle-delay"],
    );
    match ctx.run(&delay) {
        ExecutionOutcome::Success(out) => match parse_gsettings_uint32(&out) {
            Some(seconds) => ScreenLock::detected(seconds),
            None => Detection::Unknown(UnknownReason::ParseFailure),
        },
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_windows(ctx: &DetectorContext) -> ScreenLockFinding {
    // 1回の PowerShell 呼び出しで3値を行単位に出させる。
    let spec = ProbeSpec::command(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "$d = Get-ItemProperty 'HKCU:\\Control Panel\\Desktop'; $d.ScreenSaveActive; $d.ScreenSaverIsSecure; $d.ScreenSaveTimeOut",
        ],
    );
    match ctx.run(&spec) {
        ExecutionOutcome::Success(out) => parse_windows_screen_saver(&out),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

/// gsettings の真偽値出力（`true` / `false`）。
fn parse_gsettings_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// gsettings の uint32 出力（`uint32 300`）。素の数値も受理する。
fn parse_gsettings_uint32(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("uint32").map(str::trim).unwrap_or(raw);
    digits.parse::<u64>().ok()
}

/// レジストリ3値（ScreenSaveActive / ScreenSaverIsSecure / ScreenSaveTimeOut）
/// を行順で解釈する。
fn parse_windows_screen_saver(raw: &str) -> ScreenLockFinding {
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let (Some(active), Some(secure), Some(timeout)) = (lines.next(), lines.next(), lines.next())
    else {
        return Detection::Unknown(UnknownReason::ParseFailure);
    };

    let active = match active {
        "1" => true,
        "0" => false,
        _ => return Detection::Unknown(UnknownReason::ParseFailure),
    };
    let secure = match secure {
        "1" => true,
        "0" => false,
        _ => return Detection::Unknown(UnknownReason::ParseFailure),
    };

    if !active || !secure {
        return Detection::NotDetected;
    }

    match timeout.parse::<u64>() {
        Ok(seconds) => ScreenLock::detected(seconds),
        Err(_) => Detection::Unknown(UnknownReason::ParseFailure),
    }
}
