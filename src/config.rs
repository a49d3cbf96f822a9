use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{CasePolicy, MatchMode, Query};

const DEFAULT_HISTORY_FILE: &str = ".bash_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Push the selection into the terminal's input queue.
    Inject,
    /// Write the selection to stdout.
    Print,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub history_path: PathBuf,
    pub query: Query,
    pub output: Output,
    pub log_file: Option<PathBuf>,
}

pub struct SettingsInput<'a> {
    pub history_file: Option<&'a Path>,
    pub query: Option<String>,
    pub mode: MatchMode,
    pub case: CasePolicy,
    pub print: bool,
    pub log_file: Option<PathBuf>,
}

pub fn resolve(input: SettingsInput<'_>) -> Result<Settings> {
    let history_path = resolve_history_path(
        input.history_file,
        env::var_os("HISTFILE"),
        dirs::home_dir(),
    )?;

    Ok(Settings {
        history_path,
        query: Query::new(input.query.unwrap_or_default(), input.mode, input.case),
        output: if input.print {
            Output::Print
        } else {
            Output::Inject
        },
        log_file: input.log_file,
    })
}

/// Picks the history source: explicit path, then `$HISTFILE`, then
/// `~/.bash_history`.
pub fn resolve_history_path(
    explicit: Option<&Path>,
    histfile: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = histfile.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let home = home.context("unable to resolve home directory; pass --history-file")?;
    Ok(home.join(DEFAULT_HISTORY_FILE))
}
