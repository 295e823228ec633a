use crate::core::{Detection, UnknownReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encryption {
    pub mechanism: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Antivirus {
    pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLock {
    pub timeout_seconds: u64,
}

pub type EncryptionFinding = Detection<Encryption>;
pub type AntivirusFinding = Detection<Antivirus>;
pub type ScreenLockFinding = Detection<ScreenLock>;

impl Encryption {
    /// 空の機構名は `Detected` として成立しない（解析失敗扱い）。
    pub fn detected(mechanism: impl Into<String>) -> EncryptionFinding {
        let mechanism = mechanism.into().trim().to_string();
        if mechanism.is_empty() {
            return Detection::Unknown(UnknownReason::ParseFailure);
        }
        Detection::Detected(Encryption { mechanism })
    }
}

impl Antivirus {
    pub fn detected(product_name: impl Into<String>) -> AntivirusFinding {
        let product_name = product_name.into().trim().to_string();
        if product_name.is_empty() {
            return Detection::Unknown(UnknownReason::ParseFailure);
        }
        Detection::Detected(Antivirus { product_name })
    }
}

impl ScreenLock {
    /// ロック有効かつタイムアウト0秒は設定の矛盾として `ParseFailure`。
    pub fn detected(timeout_seconds: u64) -> ScreenLockFinding {
        if timeout_seconds == 0 {
            return Detection::Unknown(UnknownReason::ParseFailure);
        }
        Detection::Detected(ScreenLock { timeout_seconds })
    }
}
