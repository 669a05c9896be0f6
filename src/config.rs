//! Session configuration.
//!
//! A [`SessionConfig`] is owned by the caller's [`crate::query::ResultSession`]; it holds the
//! input-file patterns every query reads from and how the extraction tool is invoked. It can be
//! built in code or loaded from JSON:
//!
//! ```json
//! { "tool": "opp_scavetool", "inputs": ["results/*.sca", "results/*.vec"] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResultsError, ResultsResult};

/// Default extraction tool program.
pub const DEFAULT_TOOL: &str = "opp_scavetool";

/// Ordered, duplicate-free list of input-file patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct InputPatterns(Vec<String>);

impl From<Vec<String>> for InputPatterns {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

impl From<InputPatterns> for Vec<String> {
    fn from(patterns: InputPatterns) -> Self {
        patterns.0
    }
}

impl InputPatterns {
    /// Create from patterns, dropping duplicates.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        out.add(patterns);
        out
    }

    /// Replace the whole set.
    pub fn set<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.clear();
        self.add(patterns);
    }

    /// Union `patterns` into the set; already present patterns keep their position.
    pub fn add<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for p in patterns {
            let p = p.into();
            if !self.0.contains(&p) {
                self.0.push(p);
            }
        }
    }

    /// Add one pattern unless it is already present.
    pub fn add_input(&mut self, pattern: impl Into<String>) {
        self.add(std::iter::once(pattern));
    }

    /// Patterns in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every pattern is a valid glob matching at least one existing path.
    pub fn check_all_match(&self) -> ResultsResult<()> {
        for pattern in &self.0 {
            let matches = glob::glob(pattern).map_err(|e| {
                ResultsError::invalid_argument(format!("invalid input pattern '{pattern}': {e}"))
            })?;
            let count = matches.filter_map(Result::ok).count();
            debug!(pattern = %pattern, files = count, "input pattern matched");
            if count == 0 {
                return Err(ResultsError::invalid_argument(format!(
                    "input pattern '{pattern}' matched no files"
                )));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for InputPatterns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Configuration of a [`crate::query::ResultSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Extraction tool program (looked up on `PATH` if not absolute).
    pub tool: PathBuf,
    /// Result files (or glob patterns) every query reads.
    pub inputs: InputPatterns,
    /// Pass `--allow-nonmatching` so filters matching nothing yield empty output.
    pub allow_nonmatching: bool,
    /// Fail a query before invoking the tool if some input pattern matches no file.
    pub require_matching_inputs: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tool: PathBuf::from(DEFAULT_TOOL),
            inputs: InputPatterns::default(),
            allow_nonmatching: true,
            require_matching_inputs: false,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON config; absent keys take their defaults.
    pub fn from_json_str(text: &str) -> ResultsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ResultsResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
