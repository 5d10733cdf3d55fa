use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::AppState;
use crate::api::error::{ApiError, ApiResult};

pub const UPLOAD_FIELD: &str = "file";
const DEFAULT_EXTENSION: &str = "png";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Path the file is served under
    pub url: String,
    pub original_name: String,
    pub size: usize,
    pub content_type: String,
}

/// Store an image (channel icon) and answer its public path
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&original_name).first().map(|m| m.to_string()))
            .unwrap_or_default();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("could not read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::bad_request("file is empty"));
        }
        if bytes.len() > state.upload.max_bytes {
            return Err(ApiError::bad_request(format!(
                "file exceeds {} bytes",
                state.upload.max_bytes
            )));
        }
        if !content_type.starts_with("image/") {
            return Err(ApiError::bad_request("only image uploads are allowed"));
        }

        let stored_name = format!(
            "{:032x}.{}",
            rand::random::<u128>(),
            file_extension(&original_name, &content_type)
        );

        let dir = Path::new(&state.upload.dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("creating upload dir {}: {e}", dir.display()))?;
        tokio::fs::write(dir.join(&stored_name), &bytes)
            .await
            .map_err(|e| anyhow::anyhow!("writing upload {stored_name}: {e}"))?;

        tracing::info!(file = %stored_name, size = bytes.len(), "Stored upload");

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url: format!("/uploads/{stored_name}"),
                original_name,
                size: bytes.len(),
                content_type,
            }),
        ));
    }

    Err(ApiError::bad_request(format!("multipart field '{UPLOAD_FIELD}' is required")))
}

/// Extension from the client file name, else from the content type
fn file_extension(original_name: &str, content_type: &str) -> String {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.bytes().all(|b| b.is_ascii_alphanumeric()));

    match from_name {
        Some(ext) => ext.to_ascii_lowercase(),
        None => mime_guess::get_mime_extensions_str(content_type)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::file_extension;

    #[test]
    fn extension_prefers_the_file_name() {
        assert_eq!(file_extension("icon.PNG", "image/png"), "png");
        assert_eq!(file_extension("logo.webp", "image/jpeg"), "webp");
    }

    #[test]
    fn odd_names_fall_back_to_content_type_or_png() {
        assert_eq!(file_extension("noext", "image/gif"), "gif");
        assert_eq!(file_extension("../../x.p/ng", "image/x-unknown-thing"), "png");
        assert_eq!(file_extension("", ""), "png");
    }
}
