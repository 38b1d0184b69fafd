pub mod generation;
pub mod itinerary_generation_service;
pub mod openai;
pub mod places_service;
pub mod upload_service;
