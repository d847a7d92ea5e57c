use serde::Serialize;

use crate::services::converter::{ConversionError, ImageConverter};
use crate::services::intake::StagedFile;
use crate::services::storage::StorageService;
use crate::utils::validation::converted_filename;

/// One successfully converted file, as reported to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedFile {
    pub original_name: String,
    pub converted_name: String,
    pub download_url: String,
    pub size: u64,
}

/// One failed file, as reported to the client
#[derive(Debug, Serialize)]
pub struct ConversionFailure {
    pub file: String,
    pub error: String,
}

/// Aggregated outcome of one conversion request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success: bool,
    pub converted_count: usize,
    pub total_files: usize,
    pub files: Vec<ConvertedFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ConversionFailure>,
}

/// Converts a batch of staged files, one at a time.
///
/// Decode/encode is memory-intensive, so files are processed strictly
/// sequentially to bound resource usage. One file's failure never aborts
/// the batch, and every staged source is deleted exactly once regardless
/// of its outcome.
pub async fn run_batch(
    converter: &dyn ImageConverter,
    storage: &StorageService,
    staged: Vec<StagedFile>,
) -> BatchResult {
    let total_files = staged.len();
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for item in staged {
        let outcome = convert_one(converter, storage, &item).await;

        if let Err(e) = tokio::fs::remove_file(&item.path).await {
            tracing::warn!(
                "Failed to remove staged file {}: {}",
                item.path.display(),
                e
            );
        }

        match outcome {
            Ok(converted) => {
                tracing::info!(
                    "Converted {} -> {} ({} bytes)",
                    item.original_name,
                    converted.converted_name,
                    converted.size
                );
                files.push(converted);
            }
            Err(e) => {
                tracing::warn!("Conversion failed for {}: {}", item.original_name, e);
                errors.push(ConversionFailure {
                    file: item.original_name,
                    error: e.to_string(),
                });
            }
        }
    }

    BatchResult {
        success: !files.is_empty(),
        converted_count: files.len(),
        total_files,
        files,
        errors,
    }
}

async fn convert_one(
    converter: &dyn ImageConverter,
    storage: &StorageService,
    item: &StagedFile,
) -> Result<ConvertedFile, ConversionError> {
    let source = tokio::fs::read(&item.path).await?;

    let converted_name = converted_filename(&item.stored_name);
    let destination = storage.converted_path(&converted_name);
    let artifact = converter.convert(&source, &destination).await?;

    Ok(ConvertedFile {
        original_name: item.original_name.clone(),
        download_url: format!("/downloads/{}", converted_name),
        converted_name,
        size: artifact.size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::services::converter::ConvertedArtifact;
    use std::path::Path;

    /// Converter double: fails on inputs starting with `corrupt`, otherwise
    /// writes a fixed payload to the destination
    struct StubConverter;

    #[async_trait::async_trait]
    impl ImageConverter for StubConverter {
        async fn convert(
            &self,
            source: &[u8],
            destination: &Path,
        ) -> Result<ConvertedArtifact, ConversionError> {
            if source.starts_with(b"corrupt") {
                return Err(ConversionError::DecodeFailed(
                    "moov atom not found".to_string(),
                ));
            }
            tokio::fs::write(destination, b"jpeg-bytes").await?;
            Ok(ConvertedArtifact {
                path: destination.to_path_buf(),
                size: 10,
            })
        }
    }

    async fn staged(storage: &StorageService, name: &str, stored: &str, data: &[u8]) -> StagedFile {
        let path = storage.staging_path(stored);
        tokio::fs::write(&path, data).await.unwrap();
        StagedFile {
            original_name: name.to_string(),
            stored_name: stored.to_string(),
            path,
            size: data.len() as u64,
        }
    }

    async fn test_storage() -> (tempfile::TempDir, StorageService) {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage_root: tmp.path().to_path_buf(),
            ..AppConfig::default()
        };
        let storage = StorageService::new(&config);
        storage.ensure_directories().await.unwrap();
        (tmp, storage)
    }

    #[tokio::test]
    async fn test_batch_partial_failure_is_isolated() {
        let (_tmp, storage) = test_storage().await;
        let batch = vec![
            staged(&storage, "good.heic", "100-good.heic", b"heic-data").await,
            staged(&storage, "bad.heic", "101-bad.heic", b"corrupt!!").await,
        ];

        let result = run_batch(&StubConverter, &storage, batch).await;

        assert!(result.success);
        assert_eq!(result.converted_count, 1);
        assert_eq!(result.total_files, 2);
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "bad.heic");
        assert_eq!(result.converted_count + result.errors.len(), result.total_files);

        assert_eq!(result.files[0].original_name, "good.heic");
        assert_eq!(result.files[0].converted_name, "100-good.jpg");
        assert_eq!(result.files[0].download_url, "/downloads/100-good.jpg");
        assert!(storage.converted_path("100-good.jpg").exists());
    }

    #[tokio::test]
    async fn test_staged_sources_removed_regardless_of_outcome() {
        let (_tmp, storage) = test_storage().await;
        let good = staged(&storage, "good.heic", "200-good.heic", b"heic-data").await;
        let bad = staged(&storage, "bad.heic", "201-bad.heic", b"corrupt!!").await;
        let good_path = good.path.clone();
        let bad_path = bad.path.clone();

        run_batch(&StubConverter, &storage, vec![good, bad]).await;

        assert!(!good_path.exists());
        assert!(!bad_path.exists());
    }

    #[tokio::test]
    async fn test_all_failures_mean_no_success() {
        let (_tmp, storage) = test_storage().await;
        let batch = vec![staged(&storage, "bad.heic", "300-bad.heic", b"corrupt!!").await];

        let result = run_batch(&StubConverter, &storage, batch).await;

        assert!(!result.success);
        assert_eq!(result.converted_count, 0);
        assert_eq!(result.errors.len(), 1);
        // No artifact may exist for a failed conversion
        assert!(!storage.converted_path("300-bad.jpg").exists());
    }

    #[tokio::test]
    async fn test_unreadable_staged_file_reports_error() {
        let (_tmp, storage) = test_storage().await;
        let missing = StagedFile {
            original_name: "ghost.heic".to_string(),
            stored_name: "400-ghost.heic".to_string(),
            path: storage.staging_path("400-ghost.heic"),
            size: 0,
        };

        let result = run_batch(&StubConverter, &storage, vec![missing]).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file, "ghost.heic");
    }
}
