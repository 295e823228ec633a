use std::time::{Duration, Instant};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::capability::CapabilityGate;
use crate::core::{SecurityReport, Snapshot};
use crate::detect::{self, DetectorContext};
use crate::platform;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 実行全体の締切。外部ツールが固まっても必ず終わる。
    pub run_timeout: Duration,
    /// プローブ1件あたりの上限（締切の残りとの小さい方が適用される）。
    pub probe_timeout: Duration,
    pub show_progress: bool,
    pub antivirus_extra: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct Engine {
    opts: EngineOptions,
}

impl Engine {
    pub fn new(opts: EngineOptions) -> Self {
        Self { opts }
    }

    /// 1回分のスナップショットを組み立てる。
    ///
    /// PlatformInfo と特権ゲートを最初に一度だけ確定し、各検出器は共有の
    /// 締切の下で順に走る。検出器内の失敗は `Unknown` の値になるため、
    /// ここは常に完全なスナップショットを返す（部分レポートは存在しない）。
    pub fn check(&self) -> Snapshot {
        let deadline = Instant::now() + self.opts.run_timeout;
        let short_timeout = std::cmp::min(self.opts.probe_timeout, Duration::from_secs(2));

        let platform = platform::resolve(short_timeout);
        let gate = CapabilityGate::probe(short_timeout);

        use std::io::IsTerminal;
        let progress_enabled = self.opts.show_progress && std::io::stderr().is_terminal();
        let pb = if progress_enabled {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.set_message("セキュリティ状態を確認中...");
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        let ctx = DetectorContext {
            platform: &platform,
            gate: &gate,
            probe_timeout: self.opts.probe_timeout,
            deadline: Some(deadline),
            antivirus_extra: &self.opts.antivirus_extra,
        };

        let encryption = detect::encryption::detect(&ctx);
        let antivirus = detect::antivirus::detect(&ctx);
        let screen_lock = detect::screen_lock::detect(&ctx);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let captured_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        Snapshot {
            platform,
            encryption,
            antivirus,
            screen_lock,
            captured_at,
        }
    }

    pub fn report(&self) -> SecurityReport {
        SecurityReport::from_snapshot(&self.check())
    }
}
