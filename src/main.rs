use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use hostprobe::config::{self, Config, GeneralConfig, load_config, load_config_from_path};
use hostprobe::report::{
    self, CpuSummaryRecord, CpuUsageRecord, ErrorRecord, NetworkRateRecord, NetworkRecord,
};
use hostprobe::system::error::SampleError;
use hostprobe::system::network::activity_delta;
use hostprobe::system::platform;
use hostprobe::system::task::Dispatcher;
use hostprobe::system::usage::{CpuSummary, LOAD_INTERVAL};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "hostprobe",
    about = "Sample per-core CPU usage and per-interface network counters"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Pretty-print the JSON result
    #[arg(long, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Per-core CPU utilization over a one second window
    Cpu {
        /// Also report the average across cores
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Cumulative per-interface packet and byte counters
    Net {
        /// Report per-second deltas instead of cumulative counters
        #[arg(long, default_value_t = false)]
        rate: bool,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Cpu(Vec<CpuUsageRecord>),
    CpuWithSummary {
        cores: Vec<CpuUsageRecord>,
        summary: Option<CpuSummaryRecord>,
    },
    Network(Vec<NetworkRecord>),
    Rates(Vec<NetworkRateRecord>),
    Error(ErrorRecord),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    init_tracing(&config.general)?;

    let dispatcher = Dispatcher::new(platform::host(&config.cpu.stat_path))?;
    let outcome = match cli.command {
        Command::Cpu { summary } => sample_cpu(&dispatcher, summary).await,
        Command::Net { rate } => sample_network(&dispatcher, rate).await,
    };

    let failed = outcome.is_err();
    let output = outcome.unwrap_or_else(|err| Output::Error(ErrorRecord::from(&err)));
    let json = if config.output.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

async fn sample_cpu(dispatcher: &Dispatcher, summary: bool) -> Result<Output, SampleError> {
    let usages = dispatcher.cpu_usage().await?;
    let cores = report::cpu_records(&usages);
    if !summary {
        return Ok(Output::Cpu(cores));
    }
    let summary = CpuSummary::from_usages(&usages).as_ref().map(CpuSummaryRecord::from);
    Ok(Output::CpuWithSummary { cores, summary })
}

async fn sample_network(dispatcher: &Dispatcher, rate: bool) -> Result<Output, SampleError> {
    let first = dispatcher.network_activity().await?;
    if !rate {
        return Ok(Output::Network(report::network_records(&first)));
    }
    tokio::time::sleep(LOAD_INTERVAL).await;
    let second = dispatcher.network_activity().await?;
    let deltas = activity_delta(&first, &second);
    Ok(Output::Rates(report::rate_records(&deltas)))
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref level) = cli.log_level {
        config.general.log_level = level.clone();
    }
    if cli.pretty {
        config.output.pretty = true;
    }

    config
}

fn init_tracing(general: &GeneralConfig) -> Result<()> {
    let level = config::parse_level(&general.log_level)
        .ok_or_else(|| eyre!("unknown log level `{}`", general.log_level))?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let installed = if general.log_format.eq_ignore_ascii_case("json") {
        tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
