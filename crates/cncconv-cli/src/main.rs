use clap::{Parser, Subcommand};
use cncconv_core::Result;
use color_eyre::eyre::{bail, eyre};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "cncconv", version, about = "CNC program dialect converter")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a single program file
    Convert {
        /// Program file to convert
        #[arg(short, long)]
        file: PathBuf,
        /// Target directory for the converted file
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// CSV rule table (source,target columns)
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Convert every file in a flat source directory
    Batch {
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Scan an already-converted file for residual source commands
    Check {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Validate directories, the rule table and the filename settings
    Validate {
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Write JSON Schemas for the report types
    Schema {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let config = cncconv_config::load_config()?;
        let filename = cncconv_config::resolve_filename(config.filename.as_ref());

        match self {
            Commands::Convert {
                file,
                out_dir,
                rules,
            } => {
                debug!("convert args: file={:?} out_dir={:?} rules={:?}", file, out_dir, rules);
                let rules = resolve_path(rules, config.rules_path.as_deref(), "--rules")?;
                let out_dir = resolve_path(out_dir, config.target_dir.as_deref(), "--out-dir")?;
                let table = cncconv_services::load_rule_table(&rules)?;
                let out = cncconv_services::convert_single_file(
                    &file, &out_dir, &table, &filename, &mut (),
                )?;
                report_ok(use_color, &format!("converted to {}", out.display()));
                Ok(())
            }

            Commands::Batch {
                source_dir,
                out_dir,
                rules,
                json,
            } => {
                let rules = resolve_path(rules, config.rules_path.as_deref(), "--rules")?;
                let source_dir =
                    resolve_path(source_dir, config.source_dir.as_deref(), "--source-dir")?;
                let out_dir = resolve_path(out_dir, config.target_dir.as_deref(), "--out-dir")?;
                let table = cncconv_services::load_rule_table(&rules)?;
                let summary = cncconv_services::batch_convert(
                    &source_dir, &out_dir, &table, &filename, &mut (),
                )?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    for outcome in &summary.files {
                        match outcome.output.as_deref() {
                            Some(out) => report_ok(use_color, &format!("{} -> {out}", outcome.file)),
                            None => report_warn(
                                use_color,
                                &format!(
                                    "{}: {}",
                                    outcome.file,
                                    outcome.error.as_deref().unwrap_or("failed")
                                ),
                            ),
                        }
                    }
                    println!(
                        "batch result: {} succeeded, {} failed, {} total",
                        summary.succeeded, summary.failed, summary.total
                    );
                }
                if summary.failed > 0 {
                    bail!("{} file(s) failed to convert", summary.failed);
                }
                Ok(())
            }

            Commands::Check { file, rules } => {
                let rules = resolve_path(rules, config.rules_path.as_deref(), "--rules")?;
                let table = cncconv_services::load_rule_table(&rules)?;
                let lines = cncconv_services::read_program_lines(&file)?;
                let findings = cncconv_services::check_residual_commands(&lines, &table);
                if findings.is_empty() {
                    report_ok(use_color, "no residual source commands found");
                } else {
                    report_warn(use_color, "not all source commands were replaced:");
                    for f in &findings {
                        println!("   line {}: '{}' still present -> {}", f.line, f.command, f.text);
                    }
                }
                Ok(())
            }

            Commands::Validate {
                source_dir,
                out_dir,
                rules,
            } => {
                let mut issues = Vec::new();
                let rules = resolve_path(rules, config.rules_path.as_deref(), "--rules")?;
                issues.extend(cncconv_validate::validate_rules_file(&rules));
                let source_dir =
                    resolve_path(source_dir, config.source_dir.as_deref(), "--source-dir")?;
                let out_dir = resolve_path(out_dir, config.target_dir.as_deref(), "--out-dir")?;
                issues.extend(cncconv_validate::validate_directories(&source_dir, &out_dir));
                if out_dir.is_dir() {
                    issues.extend(cncconv_validate::validate_write_permissions(&out_dir));
                }
                issues.extend(cncconv_validate::validate_filename_settings(&filename));

                if issues.is_empty() {
                    report_ok(use_color, "all settings are valid");
                    Ok(())
                } else {
                    for issue in &issues {
                        report_warn(use_color, &format!("[{}] {}", issue.kind, issue.message));
                    }
                    cncconv_validate::ensure_valid(issues)?;
                    Ok(())
                }
            }

            Commands::Schema { out_dir } => {
                let dir = out_dir.unwrap_or_else(|| PathBuf::from("docs/schemas"));
                std::fs::create_dir_all(&dir)?;
                write_schema::<cncconv_domain::BatchSummary>(&dir, "batch_summary")?;
                write_schema::<cncconv_domain::ResidualFinding>(&dir, "residual_finding")?;
                write_schema::<cncconv_domain::ValidationIssue>(&dir, "validation_issue")?;
                report_ok(use_color, &format!("schemas written to {}", dir.display()));
                Ok(())
            }
        }
    }
}

fn write_schema<T: schemars::JsonSchema>(dir: &std::path::Path, name: &str) -> Result<()> {
    let schema = schemars::schema_for!(T);
    let path = dir.join(format!("{name}.schema.json"));
    std::fs::write(&path, serde_json::to_string_pretty(&schema)?)?;
    info!("schema written: {}", path.display());
    Ok(())
}

fn resolve_path(flag: Option<PathBuf>, config: Option<&str>, what: &str) -> Result<PathBuf> {
    flag.or_else(|| config.map(PathBuf::from))
        .ok_or_else(|| eyre!("{what} is required (flag or cncconv.toml)"))
}

fn report_ok(use_color: bool, message: &str) {
    if use_color {
        use owo_colors::OwoColorize;
        println!("{} {}", "✔".green(), message);
    } else {
        println!("✔ {message}");
    }
}

fn report_warn(use_color: bool, message: &str) {
    if use_color {
        use owo_colors::OwoColorize;
        println!("{} {}", "⚠".yellow(), message);
    } else {
        println!("⚠ {message}");
    }
}

fn init_tracing() {
    // mirror of the desktop tool's logging: INFO on the console,
    // DEBUG into a daily file under ./logs
    let _ = std::fs::create_dir_all("./logs");
    let file_appender = rolling::daily("./logs", "cncconv.log");
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new("debug"));
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        );
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing();

    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    cli.cmd.run(use_color)
}
