use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    // TOMLではテーブルより前に値を出力する必要があるため先頭に置く。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub ui: UiConfig,
    pub probe: ProbeConfig,
    pub report: ReportConfig,
    pub antivirus: AntivirusConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AntivirusConfig {
    /// `プロセス名=製品名` 形式。許可リストに追記される。
    pub extra_processes: Vec<String>,
}

impl AntivirusConfig {
    /// `comm=Product` を (comm, product) に分解する。`=` がなければ
    /// プロセス名をそのまま製品名として扱う。
    pub fn parsed_extra(&self) -> Vec<(String, String)> {
        self.extra_processes
            .iter()
            .filter_map(|entry| {
                let entry = entry.trim();
                if entry.is_empty() {
                    return None;
                }
                match entry.split_once('=') {
                    Some((comm, product)) if !comm.trim().is_empty() => Some((
                        comm.trim().to_string(),
                        if product.trim().is_empty() {
                            comm.trim().to_string()
                        } else {
                            product.trim().to_string()
                        },
                    )),
                    Some(_) => None,
                    None => Some((entry.to_string(), entry.to_string())),
                }
            })
            .collect()
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig { color: true },
            probe: ProbeConfig { timeout_secs: 5 },
            report: ReportConfig { pretty: true },
            antivirus: AntivirusConfig {
                extra_processes: vec![],
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    probe: Option<RawProbeConfig>,
    report: Option<RawReportConfig>,
    antivirus: Option<RawAntivirusConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawProbeConfig {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawReportConfig {
    pretty: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawAntivirusConfig {
    extra_processes: Option<Vec<String>>,
}

pub fn home_dir() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/guardpost/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .or_else(|| home_dir.map(default_config_path));

    if let Some(path) = path {
        if path.exists() {
            let s = std::fs::read_to_string(&path).with_context(|| {
                format!("設定ファイルの読み取りに失敗しました: {}", path.display())
            })?;
            let raw: RawConfig =
                toml::from_str(&s).context("設定ファイル(TOML)の解析に失敗しました")?;
            apply_raw_config(&mut cfg, raw);
            cfg.config_path = Some(path.display().to_string());
        }
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
    }

    if let Some(probe) = raw.probe {
        if let Some(timeout_secs) = probe.timeout_secs {
            cfg.probe.timeout_secs = timeout_secs;
        }
    }

    if let Some(report) = raw.report {
        if let Some(pretty) = report.pretty {
            cfg.report.pretty = pretty;
        }
    }

    if let Some(antivirus) = raw.antivirus {
        if let Some(extra_processes) = antivirus.extra_processes {
            cfg.antivirus.extra_processes = extra_processes;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("GUARDPOST_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "GUARDPOST_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("GUARDPOST_PROBE_TIMEOUT_SECS") {
        cfg.probe.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "GUARDPOST_PROBE_TIMEOUT_SECS")?;
    }
    if let Ok(v) = std::env::var("GUARDPOST_REPORT_PRETTY") {
        cfg.report.pretty = parse_bool(&v).with_context(|| "GUARDPOST_REPORT_PRETTY")?;
    }
    if let Ok(v) = std::env::var("GUARDPOST_ANTIVIRUS_EXTRA_PROCESSES") {
        let parts: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if !parts.is_empty() {
            cfg.antivirus.extra_processes = parts;
        }
    }

    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "真偽値が不正です: {s}（true|false|1|0|yes|no|on|off を指定してください）"
        )),
    }
}
