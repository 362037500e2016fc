//! Result persistence.
//!
//! `OutputWriter` owns an output directory and writes the run's files into it:
//!
//! | file                             | content                                  |
//! |----------------------------------|------------------------------------------|
//! | `input.txt`                      | every candidate, written before the run  |
//! | `error.txt`                      | failed set, rewritten after every pass   |
//! | `domain.txt`                     | unregistered (available) domains         |
//! | `registered.txt`                 | registered domains                       |
//! | `results.json`                   | every `CheckResult`                      |
//! | `domains-<suffixes>-<length>.md` | markdown summary                         |

use crate::error::SweepError;
use crate::types::{Status, SweepReport};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const INPUT_FILE: &str = "input.txt";
pub const ERROR_FILE: &str = "error.txt";
pub const AVAILABLE_FILE: &str = "domain.txt";
pub const REGISTERED_FILE: &str = "registered.txt";
pub const RESULTS_FILE: &str = "results.json";

/// What the markdown summary describes besides the results themselves.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub started_at: DateTime<Local>,
    pub suffixes: Vec<String>,
    pub length: usize,
    pub elapsed: Duration,
}

/// Writes result files into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write every candidate to `input.txt`.
    pub fn write_input(&self, domains: &[String]) -> Result<PathBuf, SweepError> {
        self.write_lines(INPUT_FILE, domains)
    }

    /// Rewrite `error.txt` with the current failed set.
    pub fn write_failed(&self, failed: &[String]) -> Result<PathBuf, SweepError> {
        self.write_lines(ERROR_FILE, failed)
    }

    /// Write the final partition and the per-domain results.
    pub fn write_report(&self, report: &SweepReport) -> Result<Vec<PathBuf>, SweepError> {
        let json = serde_json::to_string_pretty(&report.results)?;

        Ok(vec![
            self.write_lines(AVAILABLE_FILE, &report.unregistered)?,
            self.write_lines(REGISTERED_FILE, &report.registered)?,
            self.write_lines(ERROR_FILE, &report.failed)?,
            self.write_file(RESULTS_FILE, &(json + "\n"))?,
        ])
    }

    /// Write the markdown summary and return its path.
    pub fn write_markdown(&self, info: &RunInfo, report: &SweepReport) -> Result<PathBuf, SweepError> {
        let name = markdown_file_name(&info.suffixes, info.length);
        self.write_file(&name, &render_markdown(info, report))
    }

    fn write_lines(&self, file: &str, lines: &[String]) -> Result<PathBuf, SweepError> {
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        self.write_file(file, &content)
    }

    fn write_file(&self, file: &str, content: &str) -> Result<PathBuf, SweepError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            SweepError::file_error(self.dir.display().to_string(), e.to_string())
        })?;

        let path = self.path(file);
        fs::write(&path, content)
            .map_err(|e| SweepError::file_error(path.display().to_string(), e.to_string()))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output file");
        Ok(path)
    }
}

/// Longest suffix part of the markdown file name before it is abbreviated.
const MAX_SUFFIX_PART: usize = 64;

/// `domains-<suffixes joined by '+'>-<length>.md`
///
/// Long suffix lists are abbreviated to `<first>+<N>more` so the name stays
/// well under file system limits.
pub fn markdown_file_name(suffixes: &[String], length: usize) -> String {
    let joined = suffixes.join("+");
    let part = match suffixes.split_first() {
        Some((first, rest)) if joined.len() > MAX_SUFFIX_PART => {
            format!("{}+{}more", first, rest.len())
        }
        _ => joined,
    };
    format!("domains-{}-{}.md", part, length)
}

/// Render the markdown summary of a run.
pub fn render_markdown(info: &RunInfo, report: &SweepReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "* Time: **{}**\n",
        info.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("* Suffixes: **{}**\n", info.suffixes.join(", ")));
    out.push_str(&format!("* Length: **{}**\n", info.length));
    out.push_str(&format!(
        "* Results (total **{}**, available **{}**, registered **{}**, failed **{}**)\n",
        report.total(),
        report.unregistered.len(),
        report.registered.len(),
        report.failed.len()
    ));

    for result in &report.results {
        let verdict = match result.status {
            Status::Unregistered => "available",
            Status::Registered => "registered",
            Status::Failed => "unknown",
        };
        out.push_str(&format!("  - **`{}`**: **{}**\n", result.domain, verdict));
    }

    out.push_str(&format!("* Passes: **{}**\n", report.passes));
    out.push_str(&format!("* Elapsed: **{}**ms\n", info.elapsed.as_millis()));
    out
}
