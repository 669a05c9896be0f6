//! Extraction tool invocation.
//!
//! Queries reach the tool through [`ExtractionTool`], so tests (and embedders with their own
//! process handling) can substitute it. [`Scavetool`] runs the real program as one blocking
//! subprocess with stdout and stderr fully buffered.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::config::{DEFAULT_TOOL, SessionConfig};
use crate::error::{ResultsError, ResultsResult};

/// Captured outcome of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Successful run with the given standard output.
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Return stdout on exit code 0, otherwise [`ResultsError::ToolFailed`].
    pub fn into_stdout(self) -> ResultsResult<Vec<u8>> {
        if self.exit_code == Some(0) {
            Ok(self.stdout)
        } else {
            Err(ResultsError::ToolFailed {
                exit_code: self.exit_code,
                stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
            })
        }
    }
}

/// Something that can run the extraction tool with an argument vector.
pub trait ExtractionTool {
    /// Run the tool to completion. Only failure to start it is an `Err`; a non-zero exit is
    /// reported through [`ToolOutput::exit_code`].
    fn run(&self, args: &[String]) -> ResultsResult<ToolOutput>;
}

impl<T: ExtractionTool + ?Sized> ExtractionTool for &T {
    fn run(&self, args: &[String]) -> ResultsResult<ToolOutput> {
        (**self).run(args)
    }
}

impl<T: ExtractionTool + ?Sized> ExtractionTool for Box<T> {
    fn run(&self, args: &[String]) -> ResultsResult<ToolOutput> {
        (**self).run(args)
    }
}

/// The `opp_scavetool` program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scavetool {
    program: PathBuf,
}

impl Scavetool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.tool.clone())
    }
}

impl Default for Scavetool {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl ExtractionTool for Scavetool {
    fn run(&self, args: &[String]) -> ResultsResult<ToolOutput> {
        debug!(program = %self.program.display(), args = ?args, "running extraction tool");
        let output = Command::new(&self.program).args(args).output()?;
        debug!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "extraction tool finished"
        );
        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Metadata query selector (the tool's `q` command flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataQuery {
    Runs,
    RunAttrs,
    IterVars,
    ConfigEntries,
    ParamAssignments,
}

impl MetadataQuery {
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Runs => "-r",
            Self::RunAttrs => "-a",
            Self::IterVars => "-i",
            Self::ConfigEntries => "-j",
            Self::ParamAssignments => "-t",
        }
    }

    /// Suffix given to this kind's columns when merged onto another table.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            Self::Runs => "_run",
            Self::RunAttrs => "_runattr",
            Self::IterVars => "_itervar",
            Self::ConfigEntries => "_config",
            Self::ParamAssignments => "_param",
        }
    }
}

/// Arguments appended to an export command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportExtras {
    pub include_fields_as_scalars: bool,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
}

impl ExportExtras {
    fn push_args(&self, args: &mut Vec<String>) {
        if self.include_fields_as_scalars {
            args.push("--add-fields-as-scalars".to_string());
        }
        if let Some(t) = self.start_time.filter(|t| !t.is_nan()) {
            args.push("--start-time".to_string());
            args.push(t.to_string());
        }
        if let Some(t) = self.end_time.filter(|t| !t.is_nan()) {
            args.push("--end-time".to_string());
            args.push(t.to_string());
        }
    }
}

/// Reject `Some("")`: an empty filter is a caller mistake, distinct from "no filter".
pub fn validate_filter(filter: Option<&str>) -> ResultsResult<()> {
    match filter {
        Some("") => Err(ResultsError::invalid_argument("empty filter expression")),
        _ => Ok(()),
    }
}

/// `x [--allow-nonmatching] <inputs> [-T t] [-f filter] -F CSV-R -o - <extras>`
pub fn export_args(
    inputs: &[String],
    allow_nonmatching: bool,
    type_filter: Option<&str>,
    filter: Option<&str>,
    extras: &ExportExtras,
) -> Vec<String> {
    let mut args = vec!["x".to_string()];
    if allow_nonmatching {
        args.push("--allow-nonmatching".to_string());
    }
    args.extend(inputs.iter().cloned());
    if let Some(t) = type_filter {
        args.push("-T".to_string());
        args.push(t.to_string());
    }
    if let Some(f) = filter {
        args.push("-f".to_string());
        args.push(f.to_string());
    }
    args.extend(["-F", "CSV-R", "-o", "-"].map(String::from));
    extras.push_args(&mut args);
    args
}

/// `q [--allow-nonmatching] <inputs> -f filter <flag> -g --tabs`
pub fn query_args(inputs: &[String], allow_nonmatching: bool, filter: &str, query: MetadataQuery) -> Vec<String> {
    let mut args = vec!["q".to_string()];
    if allow_nonmatching {
        args.push("--allow-nonmatching".to_string());
    }
    args.extend(inputs.iter().cloned());
    args.extend(["-f", filter, query.flag(), "-g", "--tabs"].map(String::from));
    args
}
