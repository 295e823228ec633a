use serde::{Deserialize, Serialize};

use crate::core::{AntivirusFinding, EncryptionFinding, ScreenLockFinding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Windows,
    MacOs,
    Linux,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub family: Family,
    pub os_name: String,
    pub os_version: String,
}

/// 1回の実行で一度だけ組み立てられる、不変のスナップショット。
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub platform: PlatformInfo,
    pub encryption: EncryptionFinding,
    pub antivirus: AntivirusFinding,
    pub screen_lock: ScreenLockFinding,
    pub captured_at: String,
}

/// 外部トランスポートへ渡すフラットなレポートレコード。
///
/// `NotDetected` と `Unknown` はどちらも false + null に畳む（仕向け先は
/// 「確認済みの不在」と「判定不能」を区別しない契約）。区別が必要な消費者は
/// `Snapshot` を直接読む。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub disk_encrypted: bool,
    pub encryption_type: Option<String>,
    pub antivirus_detected: bool,
    pub antivirus_name: Option<String>,
    pub screen_lock_active: bool,
    pub screen_lock_time: Option<u64>,
    pub operating_system: String,
    pub os_version: String,
    pub last_check: String,
}

impl SecurityReport {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let encryption_type = snapshot
            .encryption
            .value()
            .map(|e| e.mechanism.clone());
        let antivirus_name = snapshot
            .antivirus
            .value()
            .map(|a| a.product_name.clone());
        let screen_lock_time = snapshot.screen_lock.value().map(|s| s.timeout_seconds);

        Self {
            disk_encrypted: snapshot.encryption.is_detected(),
            encryption_type,
            antivirus_detected: snapshot.antivirus.is_detected(),
            antivirus_name,
            screen_lock_active: snapshot.screen_lock.is_detected(),
            screen_lock_time,
            operating_system: snapshot.platform.os_name.clone(),
            os_version: snapshot.platform.os_version.clone(),
            last_check: snapshot.captured_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Antivirus, Detection, Encryption, ScreenLock, UnknownReason};

    fn platform() -> PlatformInfo {
        PlatformInfo {
            family: Family::MacOs,
            os_name: "macOS".to_string(),
            os_version: "14.4".to_string(),
        }
    }

    #[test]
    fn flatten_maps_detected_to_true_plus_value() {
        let snapshot = Snapshot {
            platform: platform(),
            encryption: Encryption::detected("FileVault"),
            antivirus: Antivirus::detected("ClamAV"),
            screen_lock: ScreenLock::detected(300),
            captured_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let report = SecurityReport::from_snapshot(&snapshot);
        assert!(report.disk_encrypted);
        assert_eq!(report.encryption_type.as_deref(), Some("FileVault"));
        assert!(report.antivirus_detected);
        assert_eq!(report.antivirus_name.as_deref(), Some("ClamAV"));
        assert!(report.screen_lock_active);
        assert_eq!(report.screen_lock_time, Some(300));
        assert_eq!(report.operating_system, "macOS");
        assert_eq!(report.os_version, "14.4");
        assert_eq!(report.last_check, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn flatten_collapses_not_detected_and_unknown_to_false_null() {
        let snapshot = Snapshot {
            platform: platform(),
            encryption: Detection::NotDetected,
            antivirus: Detection::Unknown(UnknownReason::PermissionDenied),
            screen_lock: Detection::Unknown(UnknownReason::Timeout),
            captured_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let report = SecurityReport::from_snapshot(&snapshot);
        assert!(!report.disk_encrypted);
        assert_eq!(report.encryption_type, None);
        assert!(!report.antivirus_detected);
        assert_eq!(report.antivirus_name, None);
        assert!(!report.screen_lock_active);
        assert_eq!(report.screen_lock_time, None);
    }
}
