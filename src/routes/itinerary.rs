use actix_web::{web, HttpResponse};
use log::info;
use serde_json::{json, Value};

use crate::db::Store;
use crate::errors::ApiError;
use crate::models::itinerary::{ItineraryDetail, ItineraryRequest, ItinerarySummary};
use crate::routes::parse_path_id;
use crate::services::generation::TextGenerator;
use crate::services::itinerary_generation_service::ItineraryGenerator;

/*
    POST /itinerary
*/
pub async fn create(
    store: web::Data<dyn Store>,
    generator: web::Data<dyn TextGenerator>,
    input: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let request = ItineraryRequest::from_json(&input)?;
    let generator = ItineraryGenerator::new(store.into_inner(), generator.into_inner());
    let (id, document) = generator.generate(&request).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "id": id.to_hex(),
        "data": document,
    })))
}

/*
    GET /itinerary/{id}
*/
pub async fn get_by_id(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Itinerary not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;
    let itinerary = store.find_itinerary(&id).await?.ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": ItineraryDetail::from(&itinerary),
    })))
}

/*
    GET /itinerary (newest first)
*/
pub async fn get_all(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let itineraries = store.list_itineraries().await?;
    let data: Vec<ItinerarySummary> = itineraries.iter().map(ItinerarySummary::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "count": data.len(),
        "data": data,
    })))
}

/*
    DELETE /itinerary/{id}
*/
pub async fn delete(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, ApiError> {
    let not_found = || ApiError::NotFound("Itinerary not found".to_string());
    let id = parse_path_id(&path).ok_or_else(not_found)?;

    if !store.delete_itinerary(&id).await? {
        return Err(not_found());
    }
    info!("Deleted itinerary {}", id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Itinerary deleted successfully" })))
}
