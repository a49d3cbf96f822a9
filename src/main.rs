mod app;
mod config;
mod highlight;
mod history;
mod inject;
mod matcher;
mod model;
mod viewport;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use config::{Output, SettingsInput};
use inject::{InjectError, InputQueue, TtyInputQueue};
use model::{CasePolicy, MatchMode};

#[derive(Debug, Parser)]
#[command(
    name = "hpick",
    version,
    about = "Pick a line from shell history and put it back on the prompt"
)]
struct Cli {
    /// Initial filter text
    query: Option<String>,

    /// History file to read. Defaults to $HISTFILE, then ~/.bash_history
    #[arg(short = 'f', long, env = "HPICK_HISTORY")]
    history_file: Option<PathBuf>,

    /// Initial match mode (cycle with Ctrl-E)
    #[arg(short, long, value_enum, default_value_t = MatchMode::ExactPrefix)]
    mode: MatchMode,

    /// Initial case policy (cycle with Ctrl-T)
    #[arg(short, long, value_enum, default_value_t = CasePolicy::Insensitive)]
    case: CasePolicy,

    /// Print the selection to stdout instead of typing it into the terminal
    #[arg(short, long)]
    print: bool,

    /// Write diagnostics to this file. Filter with RUST_LOG
    #[arg(long, env = "HPICK_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::resolve(SettingsInput {
        history_file: cli.history_file.as_deref(),
        query: cli.query,
        mode: cli.mode,
        case: cli.case,
        print: cli.print,
        log_file: cli.log_file,
    })?;
    let _log_guard = match &settings.log_file {
        Some(path) => Some(init_logging(path)?),
        None => None,
    };

    let candidates = history::load_history(&settings.history_path);
    let Some(selection) = app::run_tui(candidates, settings.query.clone())? else {
        tracing::info!("selection cancelled");
        return Ok(());
    };

    emit_selection(
        settings.output,
        &selection,
        TtyInputQueue::stdin,
        &mut io::stdout(),
        &mut io::stderr(),
    )
}

/// Hands the confirmed line to its destination. Injection failures are
/// reported on `err` and are not fatal.
fn emit_selection<Q, F, O, E>(
    output: Output,
    selection: &str,
    open_queue: F,
    out: &mut O,
    err: &mut E,
) -> Result<()>
where
    Q: InputQueue,
    F: FnOnce() -> Result<Q, InjectError>,
    O: Write,
    E: Write,
{
    match output {
        Output::Print => {
            writeln!(out, "{selection}").context("failed to print selection")?;
        }
        Output::Inject => {
            let injected = match open_queue() {
                Ok(mut queue) => inject::inject(&mut queue, selection),
                Err(error) => Err(error),
            };
            match injected {
                Ok(()) => {
                    tracing::info!(bytes = selection.len(), "selection injected");
                    if !selection.is_empty() {
                        writeln!(out).context("failed to write newline")?;
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "injection failed");
                    writeln!(err, "hpick: failed to simulate terminal input: {error}")
                        .context("failed to write diagnostic")?;
                }
            }
        }
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("log file has no name: {}", path.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to install log subscriber")?;
    Ok(guard)
}
