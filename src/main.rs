use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use chrono::NaiveDate;
use market_data::MarketDataProvider;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use ticker_scope::params::parse_date;
use ticker_scope::pipeline::PipelineSettings;
use ticker_scope::report::{render_html, render_text};
use ticker_scope::{Dashboard, DashboardConfig, DashboardReport, InputParams, Metric, ViewMode};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stock price dashboard: history, statistics, charts and a SARIMA forecast
#[derive(Parser)]
#[command(name = "ticker-scope", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build one report and print it
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        /// Also write an HTML report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the derived price table as CSV
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
    /// Prompt for control changes and re-run on each change
    Interactive {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Write a configuration file with every default spelled out
    InitConfig { path: PathBuf },
}

/// Overrides for the `[defaults]` section
#[derive(Args)]
struct InputArgs {
    #[arg(short, long)]
    ticker: Option<String>,

    /// First date, YYYY-MM-DD
    #[arg(long, value_parser = parse_cli_date)]
    start: Option<NaiveDate>,

    /// End date (exclusive), YYYY-MM-DD
    #[arg(long, value_parser = parse_cli_date)]
    end: Option<NaiveDate>,

    #[arg(short, long, value_enum)]
    metric: Option<Metric>,

    #[arg(long, value_enum)]
    view: Option<ViewMode>,
}

impl InputArgs {
    fn apply(&self, mut params: InputParams) -> InputParams {
        if let Some(ticker) = &self.ticker {
            params.ticker = ticker.clone();
        }
        if let Some(start) = self.start {
            params.start = start;
        }
        if let Some(end) = self.end {
            params.end = end;
        }
        if let Some(metric) = self.metric {
            params.metric = metric;
        }
        if let Some(view) = self.view {
            params.view = view;
        }
        params
    }
}

fn parse_cli_date(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Run {
            inputs,
            html,
            json,
            export_csv,
        } => {
            let params = inputs.apply(config.defaults.to_params()?);
            let mut dashboard = new_dashboard(&config)?;
            let report = dashboard.refresh(&params).report;

            print!("{}", render_text(report)?);
            write_outputs(report, html.as_deref(), json.as_deref(), export_csv.as_deref())?;
        }
        Command::Interactive { inputs } => {
            let params = inputs.apply(config.defaults.to_params()?);
            let mut dashboard = new_dashboard(&config)?;
            interactive(&mut dashboard, params)?;
        }
        Command::InitConfig { path } => {
            DashboardConfig::default()
                .save(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

fn new_dashboard(
    config: &DashboardConfig,
) -> Result<Dashboard<Box<dyn MarketDataProvider>>> {
    let provider = config.data.provider()?;
    info!(provider = provider.name(), "provider ready");
    Ok(Dashboard::new(
        provider,
        config.data.cache_capacity,
        PipelineSettings::from(config),
    ))
}

fn write_outputs(
    report: &DashboardReport,
    html: Option<&Path>,
    json: Option<&Path>,
    export_csv: Option<&Path>,
) -> Result<()> {
    if let Some(path) = html {
        std::fs::write(path, render_html(report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("HTML report written to {}", path.display());
    }
    if let Some(path) = json {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("JSON report written to {}", path.display());
    }
    if let Some(path) = export_csv {
        match report.data.rendered() {
            Some(table) => {
                table
                    .write_csv(path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("Price table written to {}", path.display());
            }
            None => eprintln!("No price table to export"),
        }
    }
    Ok(())
}

const HELP: &str = "commands: set <ticker|start|end|metric|view> <value>, show, rerun, help, quit";

fn interactive(
    dashboard: &mut Dashboard<Box<dyn MarketDataProvider>>,
    mut params: InputParams,
) -> Result<()> {
    println!("{}", HELP);
    print!("{}", render_text(dashboard.refresh(&params).report)?);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();

        match words.next() {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some("help") => println!("{}", HELP),
            Some("show") => {
                println!("{}", params);
                let stats = dashboard.cache_stats();
                println!(
                    "runs: {}, cache hits: {}, misses: {}",
                    dashboard.runs(),
                    stats.hits,
                    stats.misses
                );
            }
            Some("rerun") => {
                print!("{}", render_text(dashboard.rerun(&params).report)?);
            }
            Some("set") => {
                let key = words.next().unwrap_or_default();
                let value = words.collect::<Vec<_>>().join(" ");
                if let Err(e) = params.set(key, &value) {
                    println!("{}", e);
                    continue;
                }

                let refresh = dashboard.refresh(&params);
                if refresh.recomputed {
                    print!("{}", render_text(refresh.report)?);
                } else {
                    println!("No change.");
                }
            }
            Some(other) => println!("unknown command {:?}; {}", other, HELP),
        }
    }

    Ok(())
}
