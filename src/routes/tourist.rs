use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use log::info;
use mongodb::bson;
use serde_json::json;

use crate::config::Config;
use crate::db::Store;
use crate::errors::ApiError;
use crate::models::tourist::{Badge, Tourist, TouristChanges, TouristResponse};
use crate::routes::{form::FormData, parse_path_id};
use crate::services::upload_service::UploadService;

const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "pwd", "badge"];
const IMAGE_FIELDS: [&str; 2] = ["profile_image", "background_image"];

fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    bcrypt::hash(password, cost)
        .map_err(|e| ApiError::InternalError(format!("Failed to hash password: {}", e)))
}

/*
    GET /tourists
*/
pub async fn get_all(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let tourists = store.list_tourists().await?;
    let data: Vec<TouristResponse> = tourists.iter().map(TouristResponse::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "count": data.len(),
        "data": data,
    })))
}

/*
    POST /tourists (multipart)
*/
pub async fn create(
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = FormData::from_multipart(payload).await?;
    if !form.has_all(&REQUIRED_FIELDS) {
        return Err(ApiError::MissingField("Missing required fields".to_string()));
    }
    let badge: Badge = form.text("badge").unwrap_or_default().parse()?;
    let password = hash_password(form.text("pwd").unwrap_or_default(), config.password_cost)?;

    let mut saved = Vec::new();
    let mut images = [None, None];
    for (slot, field) in images.iter_mut().zip(IMAGE_FIELDS) {
        if let Some(file) = form.file(field) {
            *slot = match uploads.save(file).await {
                Ok(path) => path,
                Err(err) => {
                    uploads.remove_all(saved.iter().map(String::as_str)).await;
                    return Err(err);
                }
            };
            saved.extend(slot.clone());
        }
    }
    let [profile_image, background_image] = images;

    let now = bson::DateTime::now();
    let tourist = Tourist {
        id: None,
        name: form.text("name").unwrap_or_default().to_string(),
        email: form.text("email").unwrap_or_default().to_string(),
        password,
        badge,
        profile_image,
        background_image,
        bio: form.text("bio").map(str::to_string),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let id = match store.insert_tourist(&tourist).await {
        Ok(id) => id,
        Err(err) => {
            uploads.remove_all(saved.iter().map(String::as_str)).await;
            return Err(err);
        }
    };
    info!("Created tourist {}", id);

    let mut response = json!({ "message": "Tourist created successfully", "id": id.to_hex() });
    if let Some(path) = &tourist.profile_image {
        response["profile_image"] = json!(path);
    }
    if let Some(path) = &tourist.background_image {
        response["background_image"] = json!(path);
    }
    if let Some(bio) = &tourist.bio {
        response["bio"] = json!(bio);
    }
    Ok(HttpResponse::Created().json(response))
}

/*
    PUT /tourists/{id} (multipart)
*/
pub async fn update(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let form = FormData::from_multipart(payload).await?;
    let not_found = || ApiError::NotFound("Tourist not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;
    let current = store.find_tourist(&id).await?.ok_or_else(not_found)?;

    let mut changes = TouristChanges {
        name: form.text("name").map(str::to_string),
        email: form.text("email").map(str::to_string),
        badge: form.text("badge").map(str::parse::<Badge>).transpose()?,
        bio: form.text("bio").map(str::to_string),
        ..Default::default()
    };
    if let Some(pwd) = form.text("pwd") {
        changes.password = Some(hash_password(pwd, config.password_cost)?);
    }

    let incoming: Vec<_> = IMAGE_FIELDS
        .iter()
        .map(|field| form.file(field).filter(|file| uploads.accepts(file)))
        .collect();
    if changes.is_empty() && incoming.iter().all(Option::is_none) {
        return Err(ApiError::MissingField("No valid fields to update".to_string()));
    }

    // New files go to disk first; the ones they replace are only removed
    // once the row points at the new paths.
    let mut saved = Vec::new();
    let mut replaced = Vec::new();
    let previous = [&current.profile_image, &current.background_image];
    for (index, file) in incoming.into_iter().enumerate() {
        let Some(file) = file else { continue };
        let public_path = match uploads.save(file).await {
            Ok(Some(path)) => path,
            Ok(None) => continue,
            Err(err) => {
                uploads.remove_all(saved.iter().map(String::as_str)).await;
                return Err(err);
            }
        };
        if let Some(old) = previous[index] {
            replaced.push(old.clone());
        }
        saved.push(public_path.clone());
        match index {
            0 => changes.profile_image = Some(public_path),
            _ => changes.background_image = Some(public_path),
        }
    }

    let outcome = store.update_tourist(&id, &changes).await;
    if !matches!(outcome, Ok(true)) {
        uploads.remove_all(saved.iter().map(String::as_str)).await;
    }
    if !outcome? {
        return Err(not_found());
    }
    uploads.remove_all(replaced.iter().map(String::as_str)).await;
    info!("Updated tourist {}", id);

    let mut response = json!({ "message": "Tourist updated successfully" });
    if let Some(path) = &changes.profile_image {
        response["profile_image"] = json!(path);
    }
    if let Some(path) = &changes.background_image {
        response["background_image"] = json!(path);
    }
    if let Some(bio) = &changes.bio {
        response["bio"] = json!(bio);
    }
    Ok(HttpResponse::Ok().json(response))
}

/*
    DELETE /tourists/{id}
*/
pub async fn delete(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
    uploads: web::Data<UploadService>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Tourist not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;
    let tourist = store.find_tourist(&id).await?.ok_or_else(not_found)?;

    // Posts and contacts must keep pointing at an existing tourist.
    let dependents = store.count_created_by(&id).await?;
    if dependents > 0 {
        return Err(ApiError::Conflict(format!(
            "Tourist still has {} posts or emergency contacts",
            dependents
        )));
    }

    if !store.delete_tourist(&id).await? {
        return Err(not_found());
    }
    uploads.remove_all(tourist.image_paths()).await;
    info!("Deleted tourist {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Tourist deleted successfully" })))
}
