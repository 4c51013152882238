//! `ssample`: read lines from stdin, keep a uniform random sample of them, and
//! print the sample (in input order, with line numbers) when stdin ends or the
//! process is interrupted.

use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ssample::logging::{init_logging, LogConfig, LogFormat};
use ssample::sink::Tee;
use ssample::termination::spawn_interrupt_listener;
use ssample::{sample_stream, serve, Config, SharedReservoir, Termination};
use tokio::io::BufReader;
use tracing::{debug, error, info};

#[derive(Debug, Parser)]
#[command(
    name = "ssample",
    version,
    about = "Keep a uniform random sample of lines read from stdin"
)]
struct Cli {
    /// Keep this many lines, uniformly sampled across all input
    #[arg(short = 'l', long = "lines", env = "SSAMPLE_LINES", default_value = "100")]
    lines: NonZeroUsize,

    /// host:port (or :port) to serve the live sample on
    #[arg(long = "http", env = "SSAMPLE_HTTP", value_name = "ADDR")]
    http: Option<String>,

    /// Also append all input to this file
    #[arg(short = 'a', long = "append", value_name = "PATH")]
    append: Option<PathBuf>,

    /// Also write all input to this file, gzipped (truncates it)
    #[arg(long = "teez", value_name = "PATH")]
    teez: Option<PathBuf>,

    /// Also write every line to stdout as it arrives
    #[arg(long)]
    echo: bool,

    /// Log filter for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long, env = "SSAMPLE_LOG", default_value = "info")]
    log_level: String,

    /// Diagnostic log format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            format: self.log_format,
        }
    }

    fn into_config(self) -> Config {
        Config {
            capacity: self.lines.get(),
            listen: self.http,
            append: self.append,
            teez: self.teez,
            echo: self.echo,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli.log_config()) {
        eprintln!("ssample: {err}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(%err, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli.into_config()));
    // A blocking stdin read cannot be cancelled; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let listener = match config.listen_addr()? {
        Some(addr) => Some(serve::bind(&addr).await?),
        None => None,
    };
    let tee = Tee::open(&config)?;
    if !tee.is_empty() {
        debug!(sinks = ?tee, "copying input to tee sinks");
    }
    info!(capacity = config.capacity, "sampling stdin");

    let reservoir = SharedReservoir::new(config.capacity);
    let termination = Termination::new();
    spawn_interrupt_listener(termination.clone());

    let snapshot = sample_stream(
        BufReader::new(tokio::io::stdin()),
        reservoir,
        tee,
        termination,
        listener,
    )
    .await;

    let mut out = BufWriter::new(io::stdout().lock());
    snapshot
        .write_numbered(&mut out)
        .and_then(|()| out.flush())
        .context("failed to write sample to stdout")?;
    Ok(())
}
