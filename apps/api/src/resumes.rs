//! Resume storage on the local filesystem.
//!
//! Uploaded PDFs are written under a server-controlled directory with a
//! generated name; the client's filename is only kept as metadata for the
//! download's suggested name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Upload cap used when none is configured.
pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

const FALLBACK_FILE_NAME: &str = "resume.pdf";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("Resume exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Resume file not found")]
    Missing,

    #[error("Resume I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an accepted upload landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResume {
    /// Original client filename, path components stripped.
    pub file_name: String,
    /// Server-side location of the binary.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ResumeStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ResumeStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Accepts `application/pdf`, with or without parameters.
    pub fn check_content_type(&self, content_type: Option<&str>) -> Result<(), ResumeError> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        if essence.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
            Ok(())
        } else {
            Err(ResumeError::NotPdf)
        }
    }

    pub fn check_size(&self, len: usize) -> Result<(), ResumeError> {
        if len > self.max_bytes {
            Err(ResumeError::TooLarge {
                limit: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    /// Writes `data` under a fresh `<uuid>.pdf` name, creating the directory
    /// on first use.
    pub async fn save(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredResume, ResumeError> {
        self.check_size(data.len())?;
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(format!("{}.pdf", Uuid::new_v4()));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;

        let stored = StoredResume {
            file_name: display_name(original_name),
            path: path.to_string_lossy().into_owned(),
        };
        info!(
            path = %stored.path,
            original = %stored.file_name,
            bytes = data.len(),
            "Stored resume"
        );
        Ok(stored)
    }

    /// Opens a stored resume for streaming, returning the handle and its size.
    pub async fn open(&self, path: &str) -> Result<(File, u64), ResumeError> {
        let file = File::open(path).await.map_err(missing_or_io)?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(ResumeError::Missing);
        }
        Ok((file, metadata.len()))
    }

    /// Deletes a stored resume. A file that is already gone is not an error.
    pub async fn remove(&self, path: &str) -> Result<(), ResumeError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ResumeError::Io(e)),
        }
    }
}

fn missing_or_io(e: std::io::Error) -> ResumeError {
    if e.kind() == ErrorKind::NotFound {
        ResumeError::Missing
    } else {
        ResumeError::Io(e)
    }
}

/// Basename of a client-supplied filename, handling both separator styles.
fn display_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        base.to_string()
    }
}

/// `Content-Disposition` value for a download. Header values must be visible
/// ASCII, so anything else (and quotes or backslashes) becomes `_`.
pub fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.trim().is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        safe
    };
    format!("attachment; filename=\"{safe}\"")
}
