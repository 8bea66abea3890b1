// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Argument parsing and subcommand dispatch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use otdr_app_core::config::{ConfigService, MemoryConfigStore};
use otdr_app_core::{
    DistanceDisplay, InspectorPrefs, LinkSummary, Notice, RecordError, TraceFormat, TraceRecord,
    PREFS_KEY,
};
use otdr_config_fs::FsConfigStore;
use rayon::prelude::*;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render;

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "otdr", author, version, about = "Inspect OTDR trace files (.sor/.sod)")]
pub struct Cli {
    /// Log decoder progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Ignore saved preferences
    #[arg(long, global = true)]
    pub no_config: bool,
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the link summary for a trace file
    Inspect {
        /// Path to a .sor/.sod file
        file: PathBuf,
        /// Print the whole decoded file as JSON
        #[arg(long)]
        json: bool,
        /// Unit for length and range
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
    },
    /// List the block directory
    Blocks {
        /// Path to a .sor/.sod file
        file: PathBuf,
    },
    /// List key events
    Events {
        /// Path to a .sor/.sod file
        file: PathBuf,
        /// Unit for event distances
        #[arg(long, value_enum)]
        unit: Option<UnitArg>,
    },
    /// Print distance/power pairs for one trace
    Trace {
        /// Path to a .sor/.sod file
        file: PathBuf,
        /// Emit every n-th sample
        #[arg(long)]
        stride: Option<usize>,
        /// Trace number in file order
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Decode many files in parallel and print one row each
    Batch {
        /// Paths to .sor/.sod files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// `--unit` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    /// Kilometers
    Km,
    /// Meters
    M,
}

impl From<UnitArg> for DistanceDisplay {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Km => Self::Kilometers,
            UnitArg::M => Self::Meters,
        }
    }
}

/// `--format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Comma separated
    Csv,
    /// Tab separated
    Tsv,
}

impl From<FormatArg> for TraceFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => Self::Csv,
            FormatArg::Tsv => Self::Tsv,
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!(err))
}

/// Saved prefs, or defaults when the config directory is unusable.
pub fn load_prefs(no_config: bool) -> InspectorPrefs {
    if no_config {
        return ConfigService::new(MemoryConfigStore::new()).load_or_default(PREFS_KEY);
    }
    match FsConfigStore::new() {
        Ok(store) => ConfigService::new(store).load_or_default(PREFS_KEY),
        Err(err) => {
            debug!(error = %err, "config directory unavailable; using default prefs");
            InspectorPrefs::default()
        }
    }
}

fn open(path: &Path) -> Result<TraceRecord> {
    TraceRecord::open(path).with_context(|| format!("cannot load {}", path.display()))
}

/// Run `command` against `prefs`, writing to `out`.
pub fn run<W: Write>(command: Commands, prefs: &InspectorPrefs, out: &mut W) -> Result<()> {
    match command {
        Commands::Inspect { file, json, unit } => {
            let record = open(&file)?;
            let decoded = record.file();
            if json {
                serde_json::to_writer_pretty(&mut *out, &*decoded)?;
                writeln!(out)?;
                return Ok(());
            }
            let display = unit.map_or(prefs.display.length_unit, DistanceDisplay::from);
            let summary = LinkSummary::from_file(&decoded, display);
            render::inspect_table(out, record.filename(), &decoded, &summary)?;
            render::notices(
                out,
                record.notices(),
                prefs.display.warn_on_checksum_mismatch,
            )?;
        }
        Commands::Blocks { file } => {
            let record = open(&file)?;
            render::blocks_table(out, &record.file())?;
        }
        Commands::Events { file, unit } => {
            let record = open(&file)?;
            let display = unit.map_or(prefs.display.length_unit, DistanceDisplay::from);
            render::events_table(out, &record.file(), display)?;
        }
        Commands::Trace {
            file,
            stride,
            index,
            format,
        } => {
            let record = open(&file)?;
            let decoded = record.file();
            let Some(trace) = decoded.trace(index) else {
                bail!(
                    "{} has no trace {index} ({} traces)",
                    record.filename(),
                    decoded.traces().len()
                );
            };
            let stride = stride.unwrap_or(prefs.chart.stride);
            let format = format.map_or(prefs.chart.trace_format, TraceFormat::from);
            render::trace_lines(out, trace, stride, format)?;
        }
        Commands::Batch { files } => {
            let rows: Vec<(String, Result<TraceRecord, RecordError>)> = files
                .par_iter()
                .map(|path| (path.display().to_string(), TraceRecord::open(path)))
                .collect();
            render::batch_table(out, &rows, prefs.display.length_unit)?;
            let failures: Vec<Notice> = rows
                .iter()
                .filter_map(|(_, r)| r.as_ref().err().map(RecordError::notice))
                .collect();
            render::notices(out, &failures, prefs.display.warn_on_checksum_mismatch)?;
            let failed = failures.len();
            if failed > 0 {
                bail!("{failed} of {} files failed to load", rows.len());
            }
        }
    }
    Ok(())
}

/// Parse arguments, install logging, load prefs and run.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let prefs = load_prefs(cli.no_config);
    debug!(?prefs, "loaded prefs");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &prefs, &mut out)
}
