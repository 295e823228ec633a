use std::time::Duration;

/// 検出器が必要とし得るプロセス特権。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    Elevated,
}

impl Capability {
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Elevated => "elevated",
        }
    }
}

/// 実行前に特権の有無を一度だけ調べ、各検出器に注入する。
/// 実行を中断させることはない: 足りない特権は検出器側で
/// `Unknown(PermissionDenied)` への降格材料になる。
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    elevated: bool,
}

impl CapabilityGate {
    pub fn probe(timeout: Duration) -> Self {
        Self {
            elevated: detect_elevated(timeout),
        }
    }

    #[cfg(test)]
    pub fn with_elevated(elevated: bool) -> Self {
        Self { elevated }
    }

    pub fn holds(&self, capability: Capability) -> bool {
        match capability {
            Capability::Elevated => self.elevated,
        }
    }

    /// 要求された特権のうち、現在保持していないものを返す。
    pub fn ensure(&self, required: &[Capability]) -> Vec<Capability> {
        required
            .iter()
            .copied()
            .filter(|cap| !self.holds(*cap))
            .collect()
    }
}

#[cfg(unix)]
fn detect_elevated(_timeout: Duration) -> bool {
    // euid 0 = root。geteuid は失敗しない。
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
fn detect_elevated(timeout: Duration) -> bool {
    use crate::probe::{self, ExecutionOutcome, ProbeSpec};

    // `net session` は管理者権限がないと失敗する定番の判定。
    let spec = ProbeSpec::command("net", &["session"]);
    matches!(probe::run(&spec, timeout), ExecutionOutcome::Success(_))
}

#[cfg(not(any(unix, windows)))]
fn detect_elevated(_timeout: Duration) -> bool {
    false
}
