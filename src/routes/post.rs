use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use log::info;
use mongodb::bson;
use serde_json::json;

use crate::db::Store;
use crate::errors::ApiError;
use crate::models::parse_object_id;
use crate::models::post::{Post, PostChanges, PostResponse};
use crate::routes::{form::FormData, parse_path_id};
use crate::services::upload_service::UploadService;

const REQUIRED_FIELDS: [&str; 4] = ["created_by", "content", "loc_link", "title"];
const IMAGE_FIELD: &str = "image";

/*
    GET /posts
*/
pub async fn get_all(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let posts = store.list_posts().await?;
    let data: Vec<PostResponse> = posts.iter().map(PostResponse::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "count": data.len(),
        "data": data,
    })))
}

/*
    POST /posts (multipart)
*/
pub async fn create(
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = FormData::from_multipart(payload).await?;
    if !form.has_all(&REQUIRED_FIELDS) {
        return Err(ApiError::MissingField("Missing required fields".to_string()));
    }

    let invalid_creator = || ApiError::InvalidInput("Invalid created_by ID".to_string());
    let created_by = form
        .text("created_by")
        .and_then(parse_object_id)
        .ok_or_else(invalid_creator)?;
    if store.find_tourist(&created_by).await?.is_none() {
        return Err(invalid_creator());
    }

    let image_url = match form.file(IMAGE_FIELD) {
        Some(file) => uploads.save(file).await?,
        None => None,
    };

    let post = Post {
        id: None,
        created_at: bson::DateTime::now(),
        created_by,
        content: form.text("content").unwrap_or_default().to_string(),
        loc_link: form.text("loc_link").unwrap_or_default().to_string(),
        image_url,
        title: form.text("title").unwrap_or_default().to_string(),
    };

    let id = match store.insert_post(&post).await {
        Ok(id) => id,
        Err(err) => {
            uploads.remove_all(post.image_url.as_deref()).await;
            return Err(err);
        }
    };
    info!("Created post {} by {}", id, created_by);

    let mut response = json!({ "message": "Post created successfully", "id": id.to_hex() });
    if let Some(image_url) = &post.image_url {
        response["image_url"] = json!(image_url);
    }
    Ok(HttpResponse::Created().json(response))
}

/*
    PUT /posts/{id} (multipart)
*/
pub async fn update(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = FormData::from_multipart(payload).await?;
    let not_found = || ApiError::NotFound("Post not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;
    let current = store.find_post(&id).await?.ok_or_else(not_found)?;

    let mut changes = PostChanges {
        content: form.text("content").map(str::to_string),
        loc_link: form.text("loc_link").map(str::to_string),
        title: form.text("title").map(str::to_string),
        image_url: None,
    };
    let incoming = form.file(IMAGE_FIELD).filter(|file| uploads.accepts(file));
    if changes.is_empty() && incoming.is_none() {
        return Err(ApiError::MissingField("No valid fields to update".to_string()));
    }

    if let Some(file) = incoming {
        changes.image_url = uploads.save(file).await?;
    }

    let outcome = store.update_post(&id, &changes).await;
    if !matches!(outcome, Ok(true)) {
        uploads.remove_all(changes.image_url.as_deref()).await;
    }
    if !outcome? {
        return Err(not_found());
    }
    if changes.image_url.is_some() {
        uploads.remove_all(current.image_url.as_deref()).await;
    }
    info!("Updated post {}", id);

    let mut response = json!({ "message": "Post updated successfully" });
    if let Some(image_url) = &changes.image_url {
        response["image_url"] = json!(image_url);
    }
    Ok(HttpResponse::Ok().json(response))
}

/*
    DELETE /posts/{id}
*/
pub async fn delete(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Post not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;
    let post = store.find_post(&id).await?.ok_or_else(not_found)?;

    if !store.delete_post(&id).await? {
        return Err(not_found());
    }
    uploads.remove_all(post.image_url.as_deref()).await;
    info!("Deleted post {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Post deleted successfully" })))
}
