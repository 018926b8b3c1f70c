//! Document upload, access, download, and delete handlers

use crate::{ApiError, AppState, ErrorCode};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use docshare_core::UploadRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Response to a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub link: String,
    pub doc_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Body of an access request
#[derive(Debug, Deserialize)]
pub struct AccessRequest {
    pub passcode: String,
}

/// Response to a granted access request
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub message: &'static str,
    pub filename: String,
    pub mime_type: Option<String>,
    pub file_size: u64,
}

/// Passcode supplied as a query parameter
#[derive(Debug, Deserialize)]
pub struct PasscodeQuery {
    pub passcode: String,
}

/// POST /api/upload - Encrypt and store a file behind a passcode
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut passcode: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| ApiError::invalid_request("file field has no filename"))?;
                let mime_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()));
                let content = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, mime_type, content));
            }
            Some("passcode") => {
                passcode = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (filename, mime_type, content) =
        file.ok_or_else(|| ApiError::invalid_request("file is required"))?;
    let passcode = passcode.ok_or_else(|| ApiError::invalid_request("passcode is required"))?;

    let receipt = state
        .service
        .upload(UploadRequest {
            content,
            passcode,
            filename,
            mime_type,
        })
        .await?;

    Ok(Json(UploadResponse {
        link: receipt.link,
        doc_id: receipt.id,
        expires_at: receipt.expires_at,
    }))
}

/// POST /api/access/{doc_id} - Verify a passcode and return metadata
pub async fn access(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
    WithRejection(Json(request), _): WithRejection<Json<AccessRequest>, ApiError>,
) -> Result<Json<AccessResponse>, ApiError> {
    let info = state.service.check_access(&doc_id, &request.passcode).await?;

    Ok(Json(AccessResponse {
        message: "Access granted",
        filename: info.filename,
        mime_type: info.mime_type,
        file_size: info.file_size,
    }))
}

/// GET /api/download/{doc_id}?passcode= - Return the decrypted file
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<PasscodeQuery>, ApiError>,
) -> Result<Response, ApiError> {
    let download = state.service.download(&doc_id, &query.passcode).await?;

    let content_type = download
        .info
        .mime_type
        .as_deref()
        .and_then(|m| m.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    let content_type = HeaderValue::from_str(content_type.as_ref())
        .map_err(|e| ApiError::Internal(format!("invalid Content-Type: {e}")))?;
    let disposition = HeaderValue::from_str(&content_disposition(&download.info.filename))
        .map_err(|e| ApiError::Internal(format!("invalid Content-Disposition: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(download.content.len())),
        ],
        download.content,
    )
        .into_response())
}

/// DELETE /api/documents/{doc_id}?passcode= - Remove a document
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<PasscodeQuery>, ApiError>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.service.delete(&doc_id, &query.passcode).await?;
    Ok(Json(serde_json::json!({ "message": "Document deleted successfully" })))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, err.body_text())
    } else {
        ApiError::invalid_request(err.body_text())
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf")]
    #[case("my file.txt", "attachment; filename=\"my file.txt\"; filename*=UTF-8''my%20file.txt")]
    #[case("a\"b.txt", "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt")]
    #[case("résumé.doc", "attachment; filename=\"r_sum_.doc\"; filename*=UTF-8''r%C3%A9sum%C3%A9.doc")]
    fn test_content_disposition(#[case] name: &str, #[case] expected: &str) {
        let value = content_disposition(name);
        assert_eq!(value, expected);
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[test]
    fn test_header_injection_neutralized() {
        let value = content_disposition("evil\r\nSet-Cookie: x=1.txt");
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
        assert!(HeaderValue::from_str(&value).is_ok());
    }
}
