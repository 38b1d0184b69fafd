use actix_web::{web, HttpResponse};
use log::info;
use serde_json::{json, Value};

use crate::db::Store;
use crate::errors::ApiError;
use crate::models::emergency_contact::{ContactChanges, ContactResponse, EmergencyContact};
use crate::routes::parse_path_id;

/*
    GET /er-cont
*/
pub async fn get_all(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let contacts = store.list_contacts().await?;
    let data: Vec<ContactResponse> = contacts.iter().map(ContactResponse::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "count": data.len(),
        "data": data,
    })))
}

/*
    POST /er-cont
*/
pub async fn create(
    store: web::Data<dyn Store>,
    input: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let contact = EmergencyContact::from_json(&input)?;
    if store.find_tourist(&contact.created_by).await?.is_none() {
        return Err(ApiError::InvalidInput("Invalid created_by ID".to_string()));
    }

    let id = store.insert_contact(&contact).await?;
    info!("Created emergency contact {}", id);

    Ok(HttpResponse::Created().json(json!({
        "message": "Emergency contact created successfully",
        "id": id.to_hex(),
    })))
}

/*
    PUT /er-cont/{id}
*/
pub async fn update(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
    input: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let changes = ContactChanges::from_json(&input)?;
    let not_found = || ApiError::NotFound("Emergency contact not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;

    if !store.update_contact(&id, &changes).await? {
        return Err(not_found());
    }
    info!("Updated emergency contact {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Emergency contact updated successfully" })))
}

/*
    DELETE /er-cont/{id}
*/
pub async fn delete(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Emergency contact not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;

    if !store.delete_contact(&id).await? {
        return Err(not_found());
    }
    info!("Deleted emergency contact {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Emergency contact deleted successfully" })))
}
