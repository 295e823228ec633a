use crate::capability::Capability;
use crate::core::{Detection, Encryption, EncryptionFinding, Family, UnknownReason};
use crate::detect::{DetectorContext, unknown_for};
use crate::probe::{ExecutionOutcome, ProbeSpec};

/// 起動ボリュームの暗号化状態を判定する。
///
/// 方針: OS標準の状態照会を優先し、補助プローブは主系が欠落/不定の場合のみ。
/// 主系ツールの欠落は「暗号化なし」の証拠ではなく `Unknown(ToolMissing)`。
/// 認識できない出力は真偽を推測せず `Unknown(ParseFailure)`。
pub fn detect(ctx: &DetectorContext) -> EncryptionFinding {
    match ctx.platform.family {
        Family::MacOs => detect_macos(ctx),
        Family::Linux => detect_linux(ctx),
        Family::Windows => detect_windows(ctx),
        Family::Other => Detection::Unknown(UnknownReason::PlatformUnsupported),
    }
}

fn detect_macos(ctx: &DetectorContext) -> EncryptionFinding {
    let primary = ProbeSpec::command("fdesetup", &["status"]);
    match ctx.run(&primary) {
        ExecutionOutcome::Success(out) => match parse_fdesetup_status(&out) {
            detected @ Detection::Detected(_) => detected,
            other => fallback_or(ctx, detect_macos_diskutil, other),
        },
        ExecutionOutcome::NotFound => {
            fallback_or(ctx, detect_macos_diskutil, Detection::Unknown(UnknownReason::ToolMissing))
        }
        ExecutionOutcome::NonZeroExit { .. } => {
            fallback_or(ctx, detect_macos_diskutil, Detection::Unknown(UnknownReason::ParseFailure))
        }
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_macos_diskutil(ctx: &DetectorContext) -> EncryptionFinding {
    let spec = ProbeSpec::command("diskutil", &["info", "/"]);
    match ctx.run(&spec) {
        ExecutionOutcome::Success(out) => parse_diskutil_info(&out),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_linux(ctx: &DetectorContext) -> EncryptionFinding {
    let primary = ProbeSpec::command("lsblk", &["-rno", "TYPE,MOUNTPOINT"]);
    match ctx.run(&primary) {
        ExecutionOutcome::Success(out) => match parse_lsblk_types(&out) {
            detected @ Detection::Detected(_) => detected,
            other => fallback_or(ctx, detect_linux_mounts, other),
        },
        ExecutionOutcome::NotFound => {
            fallback_or(ctx, detect_linux_mounts, Detection::Unknown(UnknownReason::ToolMissing))
        }
        ExecutionOutcome::NonZeroExit { .. } => {
            fallback_or(ctx, detect_linux_mounts, Detection::Unknown(UnknownReason::ParseFailure))
        }
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_linux_mounts(ctx: &DetectorContext) -> EncryptionFinding {
    let spec = ProbeSpec::file("/proc/mounts");
    match ctx.run(&spec) {
        ExecutionOutcome::Success(out) => parse_proc_mounts(&out),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_windows(ctx: &DetectorContext) -> EncryptionFinding {
    // manage-bde は管理者権限必須。走らせる前にゲートで判定して降格する。
    if !ctx.gate.ensure(&[Capability::Elevated]).is_empty() {
        return Detection::Unknown(UnknownReason::PermissionDenied);
    }

    let primary = ProbeSpec::command("manage-bde", &["-status", "C:"]);
    match ctx.run(&primary) {
        ExecutionOutcome::Success(out) => match parse_manage_bde_status(&out) {
            detected @ Detection::Detected(_) => detected,
            other => fallback_or(ctx, detect_windows_powershell, other),
        },
        ExecutionOutcome::NotFound => fallback_or(
            ctx,
            detect_windows_powershell,
            Detection::Unknown(UnknownReason::ToolMissing),
        ),
        ExecutionOutcome::NonZeroExit { .. } => fallback_or(
            ctx,
            detect_windows_powershell,
            Detection::Unknown(UnknownReason::ParseFailure),
        ),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_windows_powershell(ctx: &DetectorContext) -> EncryptionFinding {
    let spec = ProbeSpec::command(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "(Get-BitLockerVolume -MountPoint C:).ProtectionStatus",
        ],
    );
    match ctx.run(&spec) {
        ExecutionOutcome::Success(out) => parse_bitlocker_protection_status(&out),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

/// 補助プローブを実行し、成果がなければ主系の結論に戻す。
/// 優先順位: 補助の `Detected` は常に勝つ。主系が `Unknown`（ツール不在や
/// 解析失敗）の場合に限り、補助の明確な `NotDetected` がそれを置き換える。
fn fallback_or(
    ctx: &DetectorContext,
    alternate: fn(&DetectorContext) -> EncryptionFinding,
    primary: EncryptionFinding,
) -> EncryptionFinding {
    match alternate(ctx) {
        detected @ Detection::Detected(_) => detected,
        Detection::NotDetected if matches!(primary, Detection::Unknown(_)) => {
            Detection::NotDetected
        }
        _ => primary,
    }
}

/// `fdesetup status` の出力。許可トークンのみ受理する。
fn parse_fdesetup_status(raw: &str) -> EncryptionFinding {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("filevault is on") {
        return Encryption::detected("FileVault");
    }
    if lower.contains("filevault is off") {
        return Detection::NotDetected;
    }
    Detection::Unknown(UnknownReason::ParseFailure)
}

/// `diskutil info /` の `FileVault: Yes|No` 行。
fn parse_diskutil_info(raw: &str) -> EncryptionFinding {
    for line in raw.lines() {
        let line = line.trim();
        let Some(value) = line.strip_prefix("FileVault:") else {
            continue;
        };
        return match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Encryption::detected("FileVault"),
            "no" => Detection::NotDetected,
            _ => Detection::Unknown(UnknownReason::ParseFailure),
        };
    }
    Detection::Unknown(UnknownReason::ParseFailure)
}

/// `lsblk -rno TYPE,MOUNTPOINT`: `crypt` 行があれば dm-crypt コンテナあり。
fn parse_lsblk_types(raw: &str) -> EncryptionFinding {
    let mut saw_any_row = false;
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let Some(device_type) = fields.next() else {
            continue;
        };
        saw_any_row = true;
        if device_type.eq_ignore_ascii_case("crypt") {
            return Encryption::detected("dm-crypt");
        }
    }
    if saw_any_row {
        Detection::NotDetected
    } else {
        Detection::Unknown(UnknownReason::ParseFailure)
    }
}

/// `/proc/mounts` のルートマウント行。`/dev/mapper/` 配下や `crypt`/`luks`
/// を含むソースは暗号化デバイス。
fn parse_proc_mounts(raw: &str) -> EncryptionFinding {
    for line in raw.lines() {
        let mut parts = line.split_whitespace();
        let Some(source) = parts.next() else {
            continue;
        };
        let Some(mountpoint) = parts.next() else {
            continue;
        };
        if mountpoint != "/" {
            continue;
        }
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("/dev/mapper/") || lower.contains("crypt") || lower.contains("luks") {
            return Encryption::detected("dm-crypt");
        }
        return Detection::NotDetected;
    }
    Detection::Unknown(UnknownReason::ParseFailure)
}

/// `manage-bde -status C:` の `Protection On|Off` 行。
fn parse_manage_bde_status(raw: &str) -> EncryptionFinding {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("protection on") {
        return Encryption::detected("BitLocker");
    }
    if lower.contains("protection off") {
        return Detection::NotDetected;
    }
    Detection::Unknown(UnknownReason::ParseFailure)
}

/// `(Get-BitLockerVolume).ProtectionStatus`: `On`/`Off` または `1`/`0`。
fn parse_bitlocker_protection_status(raw: &str) -> EncryptionFinding {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "1" => Encryption::detected("BitLocker"),
        "off" | "0" => Detection::NotDetected,
        _ => Detection::Unknown(UnknownReason::ParseFailure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityGate;
    use crate::core::PlatformInfo;
    use std::time::Duration;

    fn test_platform(family: Family) -> PlatformInfo {
        PlatformInfo {
            family,
            os_name: "test-os".to_string(),
            os_version: "0.0".to_string(),
        }
    }

    fn test_ctx<'a>(
        platform: &'a PlatformInfo,
        gate: &'a CapabilityGate,
    ) -> DetectorContext<'a> {
        DetectorContext {
            platform,
            gate,
            probe_timeout: Duration::from_secs(1),
            deadline: None,
            antivirus_extra: &[],
        }
    }

    fn alternate_not_detected(_ctx: &DetectorContext) -> EncryptionFinding {
        Detection::NotDetected
    }

    fn alternate_unavailable(_ctx: &DetectorContext) -> EncryptionFinding {
        Detection::Unknown(UnknownReason::ToolMissing)
    }

    #[test]
    fn windows_without_elevation_degrades_to_permission_denied() {
        // manage-bde は走らせない: ゲート不足の時点で降格する。
        let platform = test_platform(Family::Windows);
        let gate = CapabilityGate::with_elevated(false);
        let ctx = test_ctx(&platform, &gate);
        assert_eq!(
            detect(&ctx),
            Detection::Unknown(UnknownReason::PermissionDenied)
        );
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn all_probe_tools_missing_degrades_to_tool_missing() {
        // このホストに fdesetup も diskutil もない。
        let platform = test_platform(Family::MacOs);
        let gate = CapabilityGate::with_elevated(false);
        let ctx = test_ctx(&platform, &gate);
        assert_eq!(detect(&ctx), Detection::Unknown(UnknownReason::ToolMissing));
    }

    #[test]
    fn indeterminate_primary_defers_to_a_definitive_alternate() {
        let platform = test_platform(Family::Linux);
        let gate = CapabilityGate::with_elevated(false);
        let ctx = test_ctx(&platform, &gate);

        // 補助が明確に「なし」と言えば、主系の解析失敗を置き換える。
        assert_eq!(
            fallback_or(
                &ctx,
                alternate_not_detected,
                Detection::Unknown(UnknownReason::ParseFailure)
            ),
            Detection::NotDetected
        );
        // 補助も不定なら主系の結論のまま。
        assert_eq!(
            fallback_or(
                &ctx,
                alternate_unavailable,
                Detection::Unknown(UnknownReason::ParseFailure)
            ),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
        // 主系が明確に「なし」なら補助は上書きしない。
        assert_eq!(
            fallback_or(&ctx, alternate_unavailable, Detection::NotDetected),
            Detection::NotDetected
        );
    }

    #[test]
    fn fdesetup_on_is_filevault() {
        let finding = parse_fdesetup_status("FileVault is On.\n");
        assert_eq!(
            finding.value().map(|e| e.mechanism.as_str()),
            Some("FileVault")
        );
    }

    #[test]
    fn fdesetup_off_is_not_detected() {
        assert_eq!(
            parse_fdesetup_status("FileVault is Off.\n"),
            Detection::NotDetected
        );
    }

    #[test]
    fn fdesetup_garbage_is_parse_failure_not_a_guess() {
        assert_eq!(
            parse_fdesetup_status("Deferred enablement pending???"),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
    }

    #[test]
    fn diskutil_filevault_line_is_recognized() {
        let raw = "   Device Identifier:         disk3s1\n   FileVault:                 Yes\n";
        assert!(parse_diskutil_info(raw).is_detected());

        let raw = "   FileVault:                 No\n";
        assert_eq!(parse_diskutil_info(raw), Detection::NotDetected);
    }

    #[test]
    fn diskutil_without_filevault_line_is_parse_failure() {
        assert_eq!(
            parse_diskutil_info("   Device Identifier: disk3s1\n"),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
    }

    #[test]
    fn lsblk_crypt_row_is_dm_crypt() {
        let raw = "disk \npart /boot\ncrypt /\n";
        let finding = parse_lsblk_types(raw);
        assert_eq!(
            finding.value().map(|e| e.mechanism.as_str()),
            Some("dm-crypt")
        );
    }

    #[test]
    fn lsblk_without_crypt_rows_is_not_detected() {
        let raw = "disk \npart /\npart /boot\n";
        assert_eq!(parse_lsblk_types(raw), Detection::NotDetected);
    }

    #[test]
    fn lsblk_empty_output_is_parse_failure() {
        assert_eq!(
            parse_lsblk_types(""),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
    }

    #[test]
    fn proc_mounts_mapper_root_is_encrypted() {
        let raw = "/dev/mapper/vg0-root / ext4 rw,relatime 0 0\nproc /proc proc rw 0 0\n";
        assert!(parse_proc_mounts(raw).is_detected());
    }

    #[test]
    fn proc_mounts_plain_root_is_not_detected() {
        let raw = "/dev/sda2 / ext4 rw,relatime 0 0\n";
        assert_eq!(parse_proc_mounts(raw), Detection::NotDetected);
    }

    #[test]
    fn proc_mounts_without_root_line_is_parse_failure() {
        let raw = "proc /proc proc rw 0 0\n";
        assert_eq!(
            parse_proc_mounts(raw),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
    }

    #[test]
    fn manage_bde_protection_on_is_bitlocker() {
        let raw = "Volume C: [OS]\n    Protection Status:    Protection On\n";
        let finding = parse_manage_bde_status(raw);
        assert_eq!(
            finding.value().map(|e| e.mechanism.as_str()),
            Some("BitLocker")
        );
    }

    #[test]
    fn manage_bde_protection_off_is_not_detected() {
        let raw = "    Protection Status:    Protection Off\n";
        assert_eq!(parse_manage_bde_status(raw), Detection::NotDetected);
    }

    #[test]
    fn bitlocker_protection_status_numeric_tokens() {
        assert!(parse_bitlocker_protection_status("1\n").is_detected());
        assert_eq!(
            parse_bitlocker_protection_status("0\n"),
            Detection::NotDetected
        );
        assert_eq!(
            parse_bitlocker_protection_status("maybe"),
            Detection::Unknown(UnknownReason::ParseFailure)
        );
    }
}
