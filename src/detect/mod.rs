use std::time::{Duration, Instant};

use crate::capability::CapabilityGate;
use crate::core::{PlatformInfo, UnknownReason};
use crate::probe::{self, ExecutionOutcome, ProbeSpec};

pub mod antivirus;
pub mod encryption;
pub mod screen_lock;

/// 各検出器に注入される共有コンテキスト。PlatformInfo と特権ゲートは
/// 実行開始時に一度だけ確定し、以後は読み取り専用。
#[derive(Debug, Clone)]
pub struct DetectorContext<'a> {
    pub platform: &'a PlatformInfo,
    pub gate: &'a CapabilityGate,
    pub probe_timeout: Duration,
    pub deadline: Option<Instant>,
    pub antivirus_extra: &'a [(String, String)],
}

impl DetectorContext<'_> {
    /// このプローブに使える残り予算。実行全体の締切を個々のプローブの
    /// タイムアウトより優先する。
    pub fn probe_budget(&self) -> Duration {
        let Some(deadline) = self.deadline else {
            return self.probe_timeout;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        std::cmp::min(self.probe_timeout, remaining)
    }

    pub fn run(&self, spec: &ProbeSpec) -> ExecutionOutcome {
        probe::run(spec, self.probe_budget())
    }
}

/// 実行結果のうち、そのまま `Unknown` に写るものの理由。
/// `Success`/`NonZeroExit` は検出器ごとの解析に委ねるため None。
pub(crate) fn unknown_for(outcome: &ExecutionOutcome) -> Option<UnknownReason> {
    match outcome {
        ExecutionOutcome::NotFound => Some(UnknownReason::ToolMissing),
        ExecutionOutcome::PermissionDenied => Some(UnknownReason::PermissionDenied),
        ExecutionOutcome::TimedOut => Some(UnknownReason::Timeout),
        ExecutionOutcome::Success(_) | ExecutionOutcome::NonZeroExit { .. } => None,
    }
}
