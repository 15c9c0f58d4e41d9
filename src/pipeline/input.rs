//! Input resolution: turn a path, URL or byte buffer into a local PDF file.
//!
//! pdfium opens documents by path, so every input ends up as a file on disk.
//! Downloads and in-memory rosters go to temp storage owned by
//! [`ResolvedInput`], which deletes it on drop. The `%PDF` magic bytes are
//! checked up front so a wrong file type is reported as such instead of as
//! a pdfium decode failure.

use crate::error::IngestError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A roster that is readable from the local file system.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; kept alive until ingestion finishes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
    /// Input was a byte buffer written to a temp file.
    InMemory(NamedTempFile),
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::InMemory(file) => file.path(),
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or HTTP/HTTPS URL to a local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, IngestError> {
    if input.trim().is_empty() {
        return Err(IngestError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write an in-memory roster to a managed temp file.
pub fn resolve_bytes(bytes: &[u8]) -> Result<ResolvedInput, IngestError> {
    let mut tmp =
        NamedTempFile::new().map_err(|e| IngestError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| IngestError::Internal(format!("tempfile write: {e}")))?;
    check_magic(tmp.path(), bytes)?;
    Ok(ResolvedInput::InMemory(tmp))
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, IngestError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(IngestError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut head = [0u8; 4];
            let read = f.read(&mut head).unwrap_or(0);
            check_magic(&path, &head[..read])?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(IngestError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(IngestError::FileNotFound { path });
        }
    }

    debug!("Resolved local roster: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Reject anything that does not start with `%PDF`.
fn check_magic(path: &Path, head: &[u8]) -> Result<(), IngestError> {
    if head.len() >= 4 && &head[..4] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(IngestError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, IngestError> {
    info!("Downloading roster from: {}", url);

    let download_failed = |reason: String| IngestError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| download_failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            IngestError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            download_failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(download_failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let temp_dir = TempDir::new().map_err(|e| IngestError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_failed(e.to_string()))?;

    check_magic(&file_path, &bytes)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| IngestError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "roster.pdf".to_string()
}
