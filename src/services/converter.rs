use std::io::Write;
use std::path::{Path, PathBuf};

use image::ImageOutputFormat;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

/// JPEG quality applied to every converted artifact
const JPEG_QUALITY: u8 = 90;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("failed to decode HEIC/HEIF input: {0}")]
    DecodeFailed(String),

    #[error("failed to encode JPEG output: {0}")]
    EncodeFailed(String),

    #[error("conversion I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The JPEG file produced by a successful conversion
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub path: PathBuf,
    pub size: u64,
}

/// Decode-then-re-encode capability for one file.
///
/// A single attempt per call; on failure no usable output exists at the
/// destination path. Retry policy, if any, belongs to the caller.
#[async_trait::async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(
        &self,
        source: &[u8],
        destination: &Path,
    ) -> Result<ConvertedArtifact, ConversionError>;
}

/// Production converter: ffmpeg decodes the HEIC container to a lossless
/// PNG intermediate, then the JPEG re-encode happens in-process.
pub struct FfmpegConverter {
    quality: u8,
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self { quality: JPEG_QUALITY }
    }
}

#[async_trait::async_trait]
impl ImageConverter for FfmpegConverter {
    async fn convert(
        &self,
        source: &[u8],
        destination: &Path,
    ) -> Result<ConvertedArtifact, ConversionError> {
        // ffmpeg detects the container by suffix
        let mut input_file = tempfile::Builder::new().suffix(".heic").tempfile()?;
        input_file.write_all(source)?;
        let input_path = input_file.into_temp_path();

        let output_file = NamedTempFile::with_suffix(".png")?;
        let output_path = output_file.path().to_path_buf();

        let output = Command::new("ffmpeg")
            .arg("-y") // Overwrite output
            .arg("-i")
            .arg(input_path.as_os_str())
            .arg("-vframes")
            .arg("1")
            .arg(&output_path)
            .output()
            .await?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("ffmpeg failed on HEIC/HEIF input: {}", err_msg);
            return Err(ConversionError::DecodeFailed(
                last_stderr_line(&err_msg).to_string(),
            ));
        }

        let png_data = tokio::fs::read(&output_path).await?;
        let img = image::load_from_memory(&png_data)
            .map_err(|e| ConversionError::DecodeFailed(e.to_string()))?;

        // JPEG carries no alpha and only 8-bit channels
        let img = image::DynamicImage::ImageRgb8(img.to_rgb8());

        let mut jpeg = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut jpeg);
        img.write_to(&mut cursor, ImageOutputFormat::Jpeg(self.quality))
            .map_err(|e| ConversionError::EncodeFailed(e.to_string()))?;

        if let Err(e) = tokio::fs::write(destination, &jpeg).await {
            // Don't leave a truncated artifact behind
            let _ = tokio::fs::remove_file(destination).await;
            return Err(ConversionError::Io(e));
        }

        Ok(ConvertedArtifact {
            path: destination.to_path_buf(),
            size: jpeg.len() as u64,
        })
    }
}

fn last_stderr_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("ffmpeg exited with an error")
        .trim()
}
