pub mod emergency_contact;
pub mod form;
pub mod health;
pub mod itinerary;
pub mod places;
pub mod post;
pub mod tourist;
pub mod uploads;

use actix_web::web;
use mongodb::bson::oid::ObjectId;

use crate::errors::ApiError;
use crate::models::parse_object_id;

/// Path ids that aren't ObjectIds can't name a stored row, so callers treat
/// `None` as not-found.
pub fn parse_path_id(raw: &str) -> Option<ObjectId> {
    parse_object_id(raw)
}

/// Registers every route. Expects `Store`, `TextGenerator`, `UploadService`,
/// `PlacesService` and `Config` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::InvalidInput(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/tourists")
            .route("", web::get().to(tourist::get_all))
            .route("", web::post().to(tourist::create))
            .route("/{id}", web::put().to(tourist::update))
            .route("/{id}", web::delete().to(tourist::delete)),
    )
    .service(
        web::scope("/posts")
            .route("", web::get().to(post::get_all))
            .route("", web::post().to(post::create))
            .route("/{id}", web::put().to(post::update))
            .route("/{id}", web::delete().to(post::delete)),
    )
    .route("/uploads/{filename}", web::get().to(uploads::get_file))
    .service(
        web::scope("/itinerary")
            .route("", web::get().to(itinerary::get_all))
            .route("", web::post().to(itinerary::create))
            .route("/{id}", web::get().to(itinerary::get_by_id))
            .route("/{id}", web::delete().to(itinerary::delete)),
    )
    .service(
        web::scope("/er-cont")
            .route("", web::get().to(emergency_contact::get_all))
            .route("", web::post().to(emergency_contact::create))
            .route("/{id}", web::put().to(emergency_contact::update))
            .route("/{id}", web::delete().to(emergency_contact::delete)),
    )
    .route("/api/nearby-places", web::get().to(places::get_nearby));
}
