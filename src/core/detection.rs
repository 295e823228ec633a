use std::fmt;

/// 検出器が返す三値の結果。`Unknown` は必ず理由を持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection<T> {
    Detected(T),
    NotDetected,
    Unknown(UnknownReason),
}

impl<T> Detection<T> {
    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Detection::Detected(value) => Some(value),
            _ => None,
        }
    }

    pub fn unknown_reason(&self) -> Option<UnknownReason> {
        match self {
            Detection::Unknown(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    PermissionDenied,
    ToolMissing,
    Timeout,
    ParseFailure,
    PlatformUnsupported,
}

impl UnknownReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnknownReason::PermissionDenied => "permission_denied",
            UnknownReason::ToolMissing => "tool_missing",
            UnknownReason::Timeout => "timeout",
            UnknownReason::ParseFailure => "parse_failure",
            UnknownReason::PlatformUnsupported => "platform_unsupported",
        }
    }
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_is_the_only_active_state() {
        let detected: Detection<u32> = Detection::Detected(1);
        let not_detected: Detection<u32> = Detection::NotDetected;
        let unknown: Detection<u32> = Detection::Unknown(UnknownReason::Timeout);

        assert!(detected.is_detected());
        assert!(!not_detected.is_detected());
        assert!(!unknown.is_detected());

        assert_eq!(detected.value(), Some(&1));
        assert_eq!(not_detected.value(), None);
        assert_eq!(unknown.value(), None);
    }

    #[test]
    fn unknown_always_carries_a_reason() {
        let unknown: Detection<u32> = Detection::Unknown(UnknownReason::ToolMissing);
        assert_eq!(unknown.unknown_reason(), Some(UnknownReason::ToolMissing));

        let not_detected: Detection<u32> = Detection::NotDetected;
        assert_eq!(not_detected.unknown_reason(), None);
    }

    #[test]
    fn reason_tokens_are_stable() {
        for (reason, token) in [
            (UnknownReason::PermissionDenied, "permission_denied"),
            (UnknownReason::ToolMissing, "tool_missing"),
            (UnknownReason::Timeout, "timeout"),
            (UnknownReason::ParseFailure, "parse_failure"),
            (UnknownReason::PlatformUnsupported, "platform_unsupported"),
        ] {
            assert_eq!(reason.as_str(), token);
        }
    }
}
