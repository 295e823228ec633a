use std::io::{self, Write};

use anyhow::Error;

use crate::core::{Detection, Snapshot, UnknownReason};

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stderr_is_tty: bool,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "エラー:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "原因:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "次に:");
    let _ = writeln!(
        stderr,
        "  - 詳細を見るには `--verbose` を付けて再実行してください"
    );
    let _ = writeln!(
        stderr,
        "  - 利用可能なコマンド/オプションは `guardpost --help` を参照してください"
    );
}

enum Mark {
    Pass,
    Fail,
    Unknown,
}

pub fn print_check(snapshot: &Snapshot, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    let _ = writeln!(
        out,
        "対象: {} {}",
        snapshot.platform.os_name, snapshot.platform.os_version
    );

    let encryption = match &snapshot.encryption {
        Detection::Detected(e) => (Mark::Pass, format!("ディスク暗号化: {}", e.mechanism)),
        Detection::NotDetected => (Mark::Fail, "ディスク暗号化: 未検出".to_string()),
        Detection::Unknown(reason) => (
            Mark::Unknown,
            format!("ディスク暗号化: 不明（{}）", reason_label(*reason)),
        ),
    };
    let antivirus = match &snapshot.antivirus {
        Detection::Detected(a) => (Mark::Pass, format!("ウイルス対策: {}", a.product_name)),
        Detection::NotDetected => (Mark::Fail, "ウイルス対策: 未検出".to_string()),
        Detection::Unknown(reason) => (
            Mark::Unknown,
            format!("ウイルス対策: 不明（{}）", reason_label(*reason)),
        ),
    };
    let screen_lock = match &snapshot.screen_lock {
        Detection::Detected(s) => (
            Mark::Pass,
            format!("スクリーンロック: 有効（{}秒）", s.timeout_seconds),
        ),
        Detection::NotDetected => (Mark::Fail, "スクリーンロック: 無効".to_string()),
        Detection::Unknown(reason) => (
            Mark::Unknown,
            format!("スクリーンロック: 不明（{}）", reason_label(*reason)),
        ),
    };

    for (mark, line) in [encryption, antivirus, screen_lock] {
        let _ = writeln!(out, "{} {}", paint_mark(&mark, cfg.color), line);
    }

    if cfg.verbose {
        let _ = writeln!(out);
        let _ = writeln!(out, "確認時刻: {}", snapshot.captured_at);
    }
}

fn reason_label(reason: UnknownReason) -> &'static str {
    match reason {
        UnknownReason::PermissionDenied => "権限不足",
        UnknownReason::ToolMissing => "確認ツールなし",
        UnknownReason::Timeout => "タイムアウト",
        UnknownReason::ParseFailure => "出力を解釈できません",
        UnknownReason::PlatformUnsupported => "未対応プラットフォーム",
    }
}

fn paint_mark(mark: &Mark, color: bool) -> String {
    let (symbol, code) = match mark {
        Mark::Pass => ("[✔]", "32"),
        Mark::Fail => ("[✘]", "31"),
        Mark::Unknown => ("[?]", "33"),
    };
    if color {
        format!("\x1b[{code}m{symbol}\x1b[0m")
    } else {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_are_plain_without_color() {
        assert_eq!(paint_mark(&Mark::Pass, false), "[✔]");
        assert_eq!(paint_mark(&Mark::Fail, false), "[✘]");
        assert_eq!(paint_mark(&Mark::Unknown, false), "[?]");
    }

    #[test]
    fn colored_marks_reset_the_terminal() {
        let painted = paint_mark(&Mark::Pass, true);
        assert!(painted.starts_with("\x1b[32m"));
        assert!(painted.ends_with("\x1b[0m"));
    }
}
