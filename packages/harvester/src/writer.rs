//! Change-aware CSV persistence.
//!
//! A dataset file is only rewritten when its content hash differs from the
//! file already on disk. Hashes are recomputed from the files on every run.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{HarvesterError, Result};

/// Extension of persisted dataset files.
pub const CSV_EXTENSION: &str = "csv";

/// Anything that is not a letter, a digit, `_` or `-`.
///
/// `\w` is not enough: it also admits combining marks, connector punctuation
/// and joiners.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}_\-]").expect("valid regex"));

/// Result of a write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Existing file already holds identical content.
    Unchanged,
    /// File was created or replaced.
    Written { bytes: usize },
}

impl WriteOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// What happened to one dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub file_name: String,
    pub path: PathBuf,
    pub outcome: WriteOutcome,
}

/// Turn a dataset title into a file stem.
///
/// Every character other than letters, digits, `-` and `_` becomes `_`, then
/// leading and trailing underscores are removed.
///
/// # Examples
/// ```
/// use dados_abertos_harvester::writer::safe_filename;
///
/// assert_eq!(safe_filename("Projetos de Lei").unwrap(), "Projetos_de_Lei");
/// assert_eq!(safe_filename("(Votações) XV.json").unwrap(), "Votações__XV_json");
/// assert!(safe_filename("?!").is_err());
/// ```
pub fn safe_filename(title: &str) -> Result<String> {
    let replaced = UNSAFE_CHARS.replace_all(title, "_");
    let stem = replaced.trim_matches('_');
    if stem.is_empty() {
        return Err(HarvesterError::InvalidTitle(title.to_string()));
    }
    Ok(stem.to_string())
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes dataset CSV files into one output directory.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    output_dir: PathBuf,
}

impl DatasetWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `content` as the file for `title`, unless it is already there.
    pub fn write_if_changed(&self, title: &str, content: &[u8]) -> Result<DatasetReport> {
        let file_name = format!("{}.{CSV_EXTENSION}", safe_filename(title)?);
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(&file_name);

        if path.is_file() {
            let existing = fs::read(&path)?;
            if content_hash(&existing) == content_hash(content) {
                tracing::debug!(file = %file_name, "Content unchanged");
                return Ok(DatasetReport {
                    file_name,
                    path,
                    outcome: WriteOutcome::Unchanged,
                });
            }
        }

        write_atomic(&self.output_dir, &file_name, content)?;
        tracing::info!(file = %file_name, bytes = content.len(), "Dataset written");

        Ok(DatasetReport {
            file_name,
            path,
            outcome: WriteOutcome::Written {
                bytes: content.len(),
            },
        })
    }
}

/// Write through a hidden temp file and rename it into place.
fn write_atomic(dir: &Path, file_name: &str, content: &[u8]) -> Result<()> {
    let output_file = dir.join(file_name);
    let temp_file = dir.join(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if output_file.exists() {
        fs::remove_file(&output_file)?;
    }

    fs::rename(&temp_file, &output_file)?;
    Ok(())
}
