/// Public file upload/download under the configured upload directory
use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpResponse};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub filename: String,
}

/// Reduce a client-supplied name to its final path component.
/// Returns None for names that would escape or name the directory itself.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();

    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }

    Some(name.to_string())
}

fn stored_path(state: &AppState, name: &str) -> PathBuf {
    PathBuf::from(&state.uploads.dir).join(name)
}

/// POST /upload (multipart field `file`)
pub async fn upload(state: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse> {
    let max_bytes = state.uploads.max_bytes;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(e.to_string()))?;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| header::ContentDisposition::from_raw(value).ok());
        let Some(disposition) = disposition else {
            continue;
        };
        if disposition.get_name() != Some(FILE_FIELD) {
            // Drain fields we do not care about
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            continue;
        }

        let name = disposition
            .get_filename()
            .and_then(sanitize_filename)
            .ok_or_else(|| AppError::BadRequest("invalid file name".to_string()))?;

        let mut contents = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if contents.len() + bytes.len() > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "upload exceeds {} bytes",
                    max_bytes
                )));
            }
            contents.extend_from_slice(&bytes);
        }

        tokio::fs::create_dir_all(&state.uploads.dir)
            .await
            .map_err(|e| AppError::Storage(format!("create upload dir: {}", e)))?;

        let path = stored_path(&state, &name);
        tokio::fs::write(&path, &contents).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to store upload");
            AppError::Storage(e.to_string())
        })?;

        tracing::info!(file = %name, size = contents.len(), "File uploaded");
        return Ok(HttpResponse::Created().json(UploadResponse {
            path: path.display().to_string(),
        }));
    }

    Err(AppError::BadRequest(format!(
        "multipart field `{}` is required",
        FILE_FIELD
    )))
}

/// GET /download?filename=
pub async fn download(
    state: web::Data<AppState>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse> {
    let name = sanitize_filename(&query.filename)
        .ok_or_else(|| AppError::BadRequest("invalid file name".to_string()))?;
    let path = stored_path(&state, &name);

    let contents = match tokio::fs::read(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("file {}", name)));
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read upload");
            return Err(AppError::Storage(e.to_string()));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        ))
        .body(contents))
}
