use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::services::places_service::PlacesService;

#[derive(Deserialize)]
pub struct QueryParams {
    lat: Option<String>,
    lng: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/*
    GET /api/nearby-places?lat=..&lng=..&type=..
*/
pub async fn get_nearby(
    places: web::Data<PlacesService>,
    params: web::Query<QueryParams>,
) -> impl Responder {
    let (Some(lat), Some(lng), Some(place_type)) = (
        present(&params.lat),
        present(&params.lng),
        present(&params.place_type),
    ) else {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "Missing required parameters",
        }));
    };

    match places.nearest(lat, lng, place_type).await {
        Ok(Some(place)) => HttpResponse::Ok().json(json!({
            "status": "success",
            "data": place,
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({
            "status": "error",
            "message": "No places found nearby",
        })),
        Err(err) => {
            error!("Nearby search failed: {}", err);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": err.to_string(),
            }))
        }
    }
}
