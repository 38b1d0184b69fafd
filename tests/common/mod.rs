#![allow(dead_code)]

use actix_web::{web, App};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roamconnect_api::{
    config::{Config, GenerationConfig},
    db::Store,
    errors::ApiError,
    models::{
        emergency_contact::{ContactChanges, ContactListing, EmergencyContact},
        itinerary::Itinerary,
        post::{Post, PostChanges, PostListing},
        tourist::{Tourist, TouristChanges},
    },
    routes,
    services::{
        generation::{GenerationError, TextGenerator},
        places_service::PlacesService,
        upload_service::UploadService,
    },
};

/// In-memory `Store` with the same observable rules as the Mongo one:
/// unique emails, inner-join listings, newest-first itineraries.
#[derive(Default)]
pub struct MemoryStore {
    pub tourists: Mutex<Vec<Tourist>>,
    pub posts: Mutex<Vec<Post>>,
    pub contacts: Mutex<Vec<EmergencyContact>>,
    pub itineraries: Mutex<Vec<Itinerary>>,
}

fn duplicate_email() -> ApiError {
    ApiError::DuplicateKey("Email already exists".to_string())
}

impl MemoryStore {
    fn creator_name(&self, id: &ObjectId) -> Option<String> {
        self.tourists
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id.as_ref() == Some(id))
            .map(|t| t.name.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn list_tourists(&self) -> Result<Vec<Tourist>, ApiError> {
        Ok(self.tourists.lock().unwrap().clone())
    }

    async fn find_tourist(&self, id: &ObjectId) -> Result<Option<Tourist>, ApiError> {
        Ok(self
            .tourists
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id.as_ref() == Some(id))
            .cloned())
    }

    async fn insert_tourist(&self, tourist: &Tourist) -> Result<ObjectId, ApiError> {
        let mut tourists = self.tourists.lock().unwrap();
        if tourists.iter().any(|t| t.email == tourist.email) {
            return Err(duplicate_email());
        }
        let id = ObjectId::new();
        let mut row = tourist.clone();
        row.id = Some(id);
        tourists.push(row);
        Ok(id)
    }

    async fn update_tourist(&self, id: &ObjectId, changes: &TouristChanges) -> Result<bool, ApiError> {
        let mut tourists = self.tourists.lock().unwrap();
        if let Some(email) = &changes.email {
            if tourists
                .iter()
                .any(|t| &t.email == email && t.id.as_ref() != Some(id))
            {
                return Err(duplicate_email());
            }
        }
        match tourists.iter_mut().find(|t| t.id.as_ref() == Some(id)) {
            Some(row) => {
                changes.apply(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tourist(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let mut tourists = self.tourists.lock().unwrap();
        let before = tourists.len();
        tourists.retain(|t| t.id.as_ref() != Some(id));
        Ok(tourists.len() < before)
    }

    async fn count_created_by(&self, id: &ObjectId) -> Result<u64, ApiError> {
        let posts = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.created_by == id)
            .count();
        let contacts = self
            .contacts
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.created_by == id)
            .count();
        Ok((posts + contacts) as u64)
    }

    async fn list_posts(&self) -> Result<Vec<PostListing>, ApiError> {
        let posts = self.posts.lock().unwrap().clone();
        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let creator_name = self.creator_name(&post.created_by)?;
                Some(PostListing { post, creator_name })
            })
            .collect())
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, ApiError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id.as_ref() == Some(id))
            .cloned())
    }

    async fn insert_post(&self, post: &Post) -> Result<ObjectId, ApiError> {
        let id = ObjectId::new();
        let mut row = post.clone();
        row.id = Some(id);
        self.posts.lock().unwrap().push(row);
        Ok(id)
    }

    async fn update_post(&self, id: &ObjectId, changes: &PostChanges) -> Result<bool, ApiError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.iter_mut().find(|p| p.id.as_ref() == Some(id)) {
            Some(row) => {
                changes.apply(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id.as_ref() != Some(id));
        Ok(posts.len() < before)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactListing>, ApiError> {
        let contacts = self.contacts.lock().unwrap().clone();
        Ok(contacts
            .into_iter()
            .filter_map(|contact| {
                let creator = self.creator_name(&contact.created_by)?;
                Some(ContactListing { contact, creator })
            })
            .collect())
    }

    async fn insert_contact(&self, contact: &EmergencyContact) -> Result<ObjectId, ApiError> {
        let id = ObjectId::new();
        let mut row = contact.clone();
        row.id = Some(id);
        self.contacts.lock().unwrap().push(row);
        Ok(id)
    }

    async fn update_contact(&self, id: &ObjectId, changes: &ContactChanges) -> Result<bool, ApiError> {
        let mut contacts = self.contacts.lock().unwrap();
        match contacts.iter_mut().find(|c| c.id.as_ref() == Some(id)) {
            Some(row) => {
                changes.apply(row);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_contact(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let mut contacts = self.contacts.lock().unwrap();
        let before = contacts.len();
        contacts.retain(|c| c.id.as_ref() != Some(id));
        Ok(contacts.len() < before)
    }

    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError> {
        let mut itineraries = self.itineraries.lock().unwrap().clone();
        // Stable sort keeps insertion order for equal timestamps; reverse that too.
        itineraries.reverse();
        itineraries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(itineraries)
    }

    async fn find_itinerary(&self, id: &ObjectId) -> Result<Option<Itinerary>, ApiError> {
        Ok(self
            .itineraries
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id.as_ref() == Some(id))
            .cloned())
    }

    async fn insert_itinerary(&self, itinerary: &Itinerary) -> Result<ObjectId, ApiError> {
        let id = ObjectId::new();
        let mut row = itinerary.clone();
        row.id = Some(id);
        self.itineraries.lock().unwrap().push(row);
        Ok(id)
    }

    async fn delete_itinerary(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let mut itineraries = self.itineraries.lock().unwrap();
        let before = itineraries.len();
        itineraries.retain(|i| i.id.as_ref() != Some(id));
        Ok(itineraries.len() < before)
    }
}

/// Stand-in generation service that always answers the same way and
/// records every prompt it was given.
pub struct ScriptedGenerator {
    reply: Result<String, GenerationError>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GenerationError) -> Self {
        Self {
            reply: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

/// A well-formed itinerary document: `days` entries, three activities each.
pub fn sample_itinerary(days: usize, budget: f64) -> Value {
    let daily: Vec<Value> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "activities": [
                    { "time": "09:00", "period": "morning", "activity": "Beach walk", "cost": 0 },
                    { "time": "14:00", "period": "afternoon", "activity": "Fort visit", "cost": 500 },
                    { "time": "19:30", "period": "evening", "activity": "Seafood dinner", "cost": 1500 },
                ],
            })
        })
        .collect();

    json!({
        "summary": "A relaxed coastal trip",
        "budget_breakdown": {
            "total": budget,
            "categories": [
                { "category": "transportation", "amount": budget * 0.3, "percentage": 30 },
                { "category": "accommodation", "amount": budget * 0.35, "percentage": 35 },
                { "category": "activities", "amount": budget * 0.1, "percentage": 10 },
                { "category": "food", "amount": budget * 0.2, "percentage": 20 },
                { "category": "miscellaneous", "amount": budget * 0.05, "percentage": 5 },
            ],
        },
        "daily_itinerary": daily,
        "restaurant_recommendations": ["Fisherman's Wharf"],
        "transportation_details": ["Flight DEL-GOI"],
        "emergency_info": {
            "police": "100",
            "ambulance": "108",
            "fire": "101",
            "embassy": "n/a",
            "hospital": "GMC Bambolim",
        },
        "local_tips": ["Rent a scooter"],
        "cultural_notes": ["Dress modestly in churches"],
    })
}

/// Wraps a document the way chat models usually do.
pub fn fenced(document: &Value) -> String {
    format!("```json\n{}\n```", serde_json::to_string_pretty(document).unwrap())
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(ScriptedGenerator::replying(fenced(&sample_itinerary(3, 50000.0))))
    }

    pub fn with_generator(generator: ScriptedGenerator) -> Self {
        let upload_dir = std::env::temp_dir().join(format!("roamconnect-test-{}", ObjectId::new()));
        Self {
            store: Arc::new(MemoryStore::default()),
            generator: Arc::new(generator),
            upload_dir,
        }
    }

    pub fn config(&self) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "roamconnect_test".to_string(),
            upload_dir: self.upload_dir.clone(),
            password_cost: 4,
            generation: GenerationConfig {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
                model: "gpt-4".to_string(),
                temperature: 0.5,
                max_tokens: 3000,
                timeout: Duration::from_secs(1),
            },
            maps_api_key: None,
            places_base_url: "http://127.0.0.1:9/nearby".to_string(),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let store: Arc<dyn Store> = self.store.clone();
        let generator: Arc<dyn TextGenerator> = self.generator.clone();
        let config = self.config();
        let uploads = UploadService::new(&config.upload_dir).unwrap();
        let places = PlacesService::new(None, config.places_base_url.clone()).unwrap();

        App::new()
            .app_data(web::Data::from(store))
            .app_data(web::Data::from(generator))
            .app_data(web::Data::new(uploads))
            .app_data(web::Data::new(places))
            .app_data(web::Data::new(config))
            .configure(routes::configure)
    }

    /// Names of the files currently in the upload directory.
    pub fn uploaded_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

#[derive(Clone, Copy)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encodes parts as `multipart/form-data`; returns (content type, body).
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let boundary = "----roamconnect-test-boundary";
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image";
