use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::api::error::AppError;
use crate::services::storage::StorageService;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub uploads_dir: String,
    pub converted_dir: String,
    pub uploads: Vec<String>,
    pub converted: Vec<String>,
}

/// Diagnostic listing of the staging and output directories.
///
/// Listing failures surface with their detail; this endpoint exists to
/// debug the storage layout.
pub async fn check_files(
    State(state): State<AppState>,
) -> Result<Json<DirectoryListing>, AppError> {
    let uploads = StorageService::list_directory(state.storage.uploads_dir())
        .await
        .map_err(|e| AppError::internal(format!("cannot list uploads: {}", e), true))?;
    let converted = StorageService::list_directory(state.storage.converted_dir())
        .await
        .map_err(|e| AppError::internal(format!("cannot list converted: {}", e), true))?;

    Ok(Json(DirectoryListing {
        uploads_dir: state.storage.uploads_dir().display().to_string(),
        converted_dir: state.storage.converted_dir().display().to_string(),
        uploads,
        converted,
    }))
}
