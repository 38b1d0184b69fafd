use std::{io, sync::Arc};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};

use roamconnect_api::{
    config::Config,
    db::{mongo, Store},
    routes,
    services::{
        generation::TextGenerator, openai::OpenAiProvider, places_service::PlacesService,
        upload_service::UploadService,
    },
};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("Application starting...");

    let config = Config::from_env().map_err(|e| startup_error("Configuration", e))?;

    let mongo_store = mongo::MongoStore::connect(&config.mongodb_uri, &config.mongodb_database)
        .await
        .map_err(|e| startup_error("MongoDB", e))?;
    info!("Connected to MongoDB database {}", config.mongodb_database);
    let store: Arc<dyn Store> = Arc::new(mongo_store);

    if config.generation.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; itinerary generation will fail");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiProvider::new(config.generation.clone())
            .map_err(|e| startup_error("Generation client", e))?,
    );

    let uploads = web::Data::new(
        UploadService::new(&config.upload_dir).map_err(|e| startup_error("Upload directory", e))?,
    );
    let places = web::Data::new(
        PlacesService::new(config.maps_api_key.clone(), config.places_base_url.clone())
            .map_err(|e| startup_error("Places client", e))?,
    );

    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);
    info!("Starting HTTP server on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(generator.clone()))
            .app_data(uploads.clone())
            .app_data(places.clone())
            .app_data(config.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
