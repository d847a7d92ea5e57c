use std::path::PathBuf;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use chrono::Utc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::services::storage::StorageService;
use crate::utils::validation::{has_allowed_extension, staged_filename};

/// Multipart form field carrying the uploads
const FILES_FIELD: &str = "files";

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("No files were uploaded")]
    NoFiles,

    #[error("Too many files: {count} exceeds the limit of {limit} per request")]
    TooManyFiles { count: usize, limit: usize },

    #[error("File '{name}' exceeds the maximum size of {limit} bytes")]
    FileTooLarge { name: String, limit: usize },

    #[error("Unsupported file type for '{name}': only .heic and .heif are accepted")]
    UnsupportedType { name: String },

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to stage upload: {0}")]
    Io(#[from] std::io::Error),
}

impl IntakeError {
    /// Staging I/O failures are the server's fault, everything else is a
    /// client error
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IntakeError::Io(_))
    }
}

/// One uploaded file on disk during its transient lifetime
#[derive(Debug)]
pub struct StagedFile {
    /// Client-supplied name, untrusted and display-only
    pub original_name: String,
    /// Sanitized, timestamp-prefixed storage name
    pub stored_name: String,
    /// Absolute path inside the staging directory
    pub path: PathBuf,
    pub size: u64,
}

/// Validates and stages every file of a multipart conversion request.
///
/// The whole request is rejected if any file fails the count, size, or
/// extension checks; validation completes before anything is written to
/// disk, so a rejected request leaves no staging side effects. If staging
/// itself fails midway, files already written for this request are removed
/// before the error propagates.
pub async fn accept_multipart(
    mut multipart: Multipart,
    config: &AppConfig,
    storage: &StorageService,
) -> Result<Vec<StagedFile>, IntakeError> {
    let mut pending: Vec<(String, axum::body::Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        if pending.len() == config.max_files_per_request {
            return Err(IntakeError::TooManyFiles {
                count: pending.len() + 1,
                limit: config.max_files_per_request,
            });
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        if !has_allowed_extension(&original_name) {
            return Err(IntakeError::UnsupportedType { name: original_name });
        }

        let bytes = field.bytes().await?;
        if bytes.len() > config.max_file_size {
            return Err(IntakeError::FileTooLarge {
                name: original_name,
                limit: config.max_file_size,
            });
        }

        pending.push((original_name, bytes));
    }

    if pending.is_empty() {
        return Err(IntakeError::NoFiles);
    }

    let mut staged = Vec::with_capacity(pending.len());
    for (original_name, bytes) in pending {
        match stage_file(storage, &original_name, &bytes).await {
            Ok(file) => staged.push(file),
            Err(e) => {
                rollback(&staged).await;
                return Err(e.into());
            }
        }
    }

    Ok(staged)
}

/// Writes one file into the staging directory under a collision-resistant
/// name. If the timestamp-prefixed name is already taken (identical name in
/// the same millisecond), the prefix is bumped until a free slot is found.
async fn stage_file(
    storage: &StorageService,
    original_name: &str,
    bytes: &[u8],
) -> std::io::Result<StagedFile> {
    let mut timestamp = Utc::now().timestamp_millis();
    let (stored_name, path) = loop {
        let candidate = staged_filename(timestamp, original_name);
        let path = storage.staging_path(&candidate);
        if !path.exists() {
            break (candidate, path);
        }
        timestamp += 1;
    };

    tokio::fs::write(&path, bytes).await?;

    Ok(StagedFile {
        original_name: original_name.to_string(),
        stored_name,
        path,
        size: bytes.len() as u64,
    })
}

async fn rollback(staged: &[StagedFile]) {
    for file in staged {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            tracing::warn!(
                "Failed to roll back staged file {}: {}",
                file.path.display(),
                e
            );
        }
    }
}
