use axum::{Json, extract::Multipart, extract::State};
use tracing::info;

use crate::AppState;
use crate::api::error::AppError;
use crate::services::{intake, orchestrator, orchestrator::BatchResult};

/// Accepts a multipart batch of HEIC/HEIF files and converts them to JPEG.
///
/// Intake failures reject the whole request; conversion failures are
/// reported per file inside the 200 response body.
pub async fn convert_files(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let staged = intake::accept_multipart(multipart, &state.config, &state.storage)
        .await
        .map_err(|e| {
            if e.is_client_error() {
                AppError::from(e)
            } else {
                // Staging I/O is a server fault; the body carries detail
                // only in development mode
                AppError::internal(e, state.config.is_development())
            }
        })?;
    info!("📥 Accepted {} file(s) for conversion", staged.len());

    let batch = orchestrator::run_batch(state.converter.as_ref(), &state.storage, staged).await;
    info!(
        "🖼️  Converted {}/{} file(s)",
        batch.converted_count, batch.total_files
    );

    Ok(Json(batch))
}
