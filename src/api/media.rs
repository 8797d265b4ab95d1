use actix_web::{HttpRequest, HttpResponse, http::header, web};
use futures::StreamExt;
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// Accepted content types and the extension stored files get.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

fn image_extension(req: &HttpRequest) -> AppResult<&'static str> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| AppError::validation("Only PNG, JPEG, WebP or GIF images are accepted"))
}

/// Collects the request body, refusing it as soon as it grows past `limit`.
async fn read_body(mut payload: web::Payload, limit: usize) -> AppResult<web::BytesMut> {
    let mut body = web::BytesMut::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::validation(format!("Invalid upload: {e}")))?;
        if body.len() + chunk.len() > limit {
            return Err(AppError::validation(format!("File exceeds the {limit} byte limit")));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

pub fn public_url(base: &str, file_name: &str) -> String {
    format!("{}/media/files/{file_name}", base.trim_end_matches('/'))
}

/// Upload a check-in photo
#[utoipa::path(
    post,
    path = "/media/upload",
    request_body(content = Vec<u8>, content_type = "image/jpeg", description = "Raw image bytes"),
    responses(
        (status = 200, description = "Stored", body = Object, example = json!({
            "url": "http://localhost:8080/media/files/3f2b9c0e8d7a4b1e9f6c5d4a3b2e1f00.jpg"
        })),
        (status = 400, description = "Empty body, unsupported type or too large", body = Object, example = json!({
            "error": "No file uploaded"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Media"
)]
#[instrument(name = "upload_photo", skip_all)]
pub async fn upload_photo(
    req: HttpRequest,
    payload: web::Payload,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let body = read_body(payload, config.max_upload_bytes).await?;
    if body.is_empty() {
        return Err(AppError::validation("No file uploaded"));
    }

    let ext = image_extension(&req)?;
    let file_name = format!("{}.{ext}", Uuid::new_v4().to_simple());
    let path = PathBuf::from(&config.media_dir).join(&file_name);
    let bytes = body.len();

    web::block(move || {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, &body)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Upload worker failed: {e}")))?
    .map_err(|e| {
        error!(error = %e, "Failed to store upload");
        AppError::Internal("Failed to store upload".into())
    })?;

    info!(file = %file_name, bytes, "Photo stored");

    Ok(HttpResponse::Ok().json(json!({
        "url": public_url(&config.public_base_url, &file_name),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test as actix_test};

    async fn upload(content_type: Option<&str>, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/media/upload", web::post().to(upload_photo)),
        )
        .await;

        let mut req = actix_test::TestRequest::post().uri("/media/upload").set_payload(body);
        if let Some(ct) = content_type {
            req = req.insert_header((header::CONTENT_TYPE, ct));
        }
        let resp = actix_test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        (status, body)
    }

    #[test]
    fn public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("http://localhost:8080/", "a.png"),
            "http://localhost:8080/media/files/a.png"
        );
    }

    #[actix_web::test]
    async fn stores_image_and_returns_url() {
        let (status, body) = upload(Some("image/png"), vec![0x89, b'P', b'N', b'G']).await;
        assert_eq!(status, StatusCode::OK);

        let url = body["url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8080/media/files/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        let stored = PathBuf::from(Config::for_tests().media_dir).join(name);
        assert_eq!(std::fs::read(&stored).unwrap(), vec![0x89, b'P', b'N', b'G']);
        std::fs::remove_file(stored).ok();
    }

    #[actix_web::test]
    async fn rejects_empty_non_image_and_oversized_bodies() {
        let (status, body) = upload(Some("image/png"), Vec::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");

        let (status, _) = upload(Some("text/plain"), b"hello".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = upload(None, b"hello".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = upload(Some("image/jpeg"), vec![0u8; 2048]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File exceeds the 1024 byte limit");
    }

    #[actix_web::test]
    async fn body_exactly_at_the_limit_is_stored() {
        let (status, body) = upload(Some("image/gif"), vec![7u8; 1024]).await;
        assert_eq!(status, StatusCode::OK);

        let url = body["url"].as_str().unwrap();
        let name = url.rsplit('/').next().unwrap();
        std::fs::remove_file(PathBuf::from(Config::for_tests().media_dir).join(name)).ok();
    }
}
