use actix_web::{web, HttpResponse};

use crate::errors::ApiError;
use crate::services::upload_service::{content_type_for, UploadService};

/*
    GET /uploads/{filename}
*/
pub async fn get_file(
    path: web::Path<String>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let filename = path.into_inner();
    let not_found = || ApiError::NotFound("File not found".to_string());
    let file_path = uploads.resolve(&filename).ok_or_else(not_found)?;

    let bytes = tokio::fs::read(&file_path).await.map_err(|_| not_found())?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&filename))
        .body(bytes))
}
