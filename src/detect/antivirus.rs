use crate::core::{Antivirus, AntivirusFinding, Detection, Family, UnknownReason};
use crate::detect::{DetectorContext, unknown_for};
use crate::probe::{ExecutionOutcome, ProbeSpec};

/// 既知ベンダーのプロセス名 → 製品名。macOS/Linux には SecurityCenter2 の
/// ような中央レジストリがないため、プロセス表の照合が代替手段になる。
const KNOWN_PROCESSES: &[(&str, &str)] = &[
    ("clamd", "ClamAV"),
    ("freshclam", "ClamAV"),
    ("falcon-sensor", "CrowdStrike Falcon"),
    ("falcond", "CrowdStrike Falcon"),
    ("wdavdaemon", "Microsoft Defender"),
    ("sav-protect", "Sophos"),
    ("sophosd", "Sophos"),
    ("sentineld", "SentinelOne"),
];

/// 稼働中のウイルス対策/エンドポイント保護製品を特定する。
/// 複数登録がある場合は最初の1件を報告し、リアルタイム保護の実態までは
/// 踏み込まない（誤った確信を避ける）。
pub fn detect(ctx: &DetectorContext) -> AntivirusFinding {
    match ctx.platform.family {
        Family::Windows => detect_windows(ctx),
        Family::MacOs => detect_process_table(ctx, &ProbeSpec::command("ps", &["-axco", "command"])),
        Family::Linux => detect_process_table(ctx, &ProbeSpec::command("ps", &["-eo", "comm="])),
        Family::Other => Detection::Unknown(UnknownReason::PlatformUnsupported),
    }
}

fn detect_windows(ctx: &DetectorContext) -> AntivirusFinding {
    let spec = ProbeSpec::command(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "Get-CimInstance -Namespace root/SecurityCenter2 -ClassName AntiVirusProduct | Select-Object -ExpandProperty displayName",
        ],
    );
    match ctx.run(&spec) {
        ExecutionOutcome::Success(out) => parse_security_center_products(&out),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

fn detect_process_table(ctx: &DetectorContext, spec: &ProbeSpec) -> AntivirusFinding {
    match ctx.run(spec) {
        ExecutionOutcome::Success(out) => match_process_table(&out, ctx.antivirus_extra),
        ExecutionOutcome::NonZeroExit { .. } => Detection::Unknown(UnknownReason::ParseFailure),
        outcome => Detection::Unknown(unknown_for(&outcome).unwrap_or(UnknownReason::ParseFailure)),
    }
}

/// SecurityCenter2 の displayName 列挙: 最初の空でない行が勝つ。
fn parse_security_center_products(raw: &str) -> AntivirusFinding {
    for line in raw.lines() {
        let name = line.trim();
        if !name.is_empty() {
            return Antivirus::detected(name);
        }
    }
    Detection::NotDetected
}

/// プロセス一覧を許可リストと照合する。プロセス名の完全一致のみ
/// （部分一致は誤検出のもと）。
fn match_process_table(raw: &str, extra: &[(String, String)]) -> AntivirusFinding {
    if raw.trim().is_empty() {
        return Detection::Unknown(UnknownReason::ParseFailure);
    }

    for line in raw.lines() {
        let Some(comm) = line.split_whitespace().next() else {
            continue;
        };
        let comm = comm.to_ascii_lowercase();
        for (needle, product) in KNOWN_PROCESSES {
            if comm == *needle {
                return Antivirus::detected(*product);
            }
        }
        for (needle, product) in extra {
            if comm == needle.to_ascii_lowercase() {
                return Antivirus::detected(product.clone());
            }
        }
    }
    Detection::NotDetected
}
