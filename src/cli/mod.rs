use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::core::SecurityReport;
use crate::engine::{Engine, EngineOptions};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "guardpost",
    version,
    about = "ワークステーションのセキュリティ状態（ディスク暗号化/ウイルス対策/スクリーンロック）を確認してレポートする"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// 実行全体のタイムアウト（秒）
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// セキュリティ状態を確認して結果を表示する
    Check(CheckArgs),
    /// トランスポート向けのフラットなJSONレポートを出力する
    Report(ReportArgs),
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {}

#[derive(Debug, Args)]
pub struct ReportArgs {}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    if cli.timeout == 0 {
        return Err(crate::exit::invalid_args(
            "--timeout は 1 以上で指定してください",
        ));
    }

    let home_dir = crate::config::home_dir();
    let env_config_path = std::env::var_os("GUARDPOST_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    )
    .map_err(crate::exit::invalid_args_err)?;

    let color = stdout_is_tty && cfg.ui.color && !cli.no_color;

    let ui_cfg = UiConfig {
        color,
        stderr_is_tty,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let engine = Engine::new(EngineOptions {
        run_timeout: Duration::from_secs(cli.timeout),
        probe_timeout: Duration::from_secs(cfg.probe.timeout_secs),
        show_progress: ui_cfg.stderr_is_tty && !cli.quiet && !cli.json,
        antivirus_extra: cfg.antivirus.parsed_extra(),
    });

    match cli.command {
        Commands::Check(_args) => {
            let snapshot = engine.check();
            if cli.json {
                write_json(&SecurityReport::from_snapshot(&snapshot), cfg.report.pretty)?;
            } else {
                crate::ui::print_check(&snapshot, &ui_cfg);
            }
        }
        Commands::Report(_args) => {
            let report = engine.report();
            write_json(&report, cfg.report.pretty)?;
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "guardpost", &mut out);
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    let stdout = std::io::stdout();
                    serde_json::to_writer_pretty(stdout.lock(), &cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: `guardpost config --show` を使用してください");
            }
        }
    }

    Ok(())
}

fn parse_shell(raw: &str) -> Result<clap_complete::Shell> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        "powershell" => Ok(clap_complete::Shell::PowerShell),
        "elvish" => Ok(clap_complete::Shell::Elvish),
        other => Err(crate::exit::invalid_args(format!(
            "completion: 未対応のシェルです: {other}（bash|zsh|fish|powershell|elvish を指定してください）"
        ))),
    }
}

fn write_json(report: &SecurityReport, pretty: bool) -> Result<()> {
    use std::io::Write;

    let buf = if pretty {
        serde_json::to_vec_pretty(report)?
    } else {
        serde_json::to_vec(report)?
    };

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}
