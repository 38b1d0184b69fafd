use async_trait::async_trait;
use futures::TryStreamExt;
use log::{info, warn};
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;

use crate::db::Store;
use crate::errors::ApiError;
use crate::models::{
    emergency_contact::{ContactChanges, ContactListing, EmergencyContact},
    itinerary::Itinerary,
    post::{Post, PostChanges, PostListing},
    tourist::{Tourist, TouristChanges},
};

const TOURISTS: &str = "tourists";
const POSTS: &str = "posts";
const EMERGENCY_CONTACTS: &str = "er";
const ITINERARIES: &str = "itineraries";

pub async fn create_mongo_client(uri: &str) -> Result<Client, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(uri).await?;

    // Timeouts given in the URI win over these defaults.
    if client_options.connect_timeout.is_none() {
        client_options.connect_timeout = Some(Duration::from_secs(10));
    }
    if client_options.server_selection_timeout.is_none() {
        client_options.server_selection_timeout = Some(Duration::from_secs(10));
    }
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    // Set the server API if using MongoDB 5.0+
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    Client::with_options(client_options)
}

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, database: &str) -> Self {
        Self {
            db: client.database(database),
        }
    }

    /// Connects and creates the unique email index. Without that index
    /// duplicate emails would be accepted, so failure here is fatal.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ApiError> {
        let client = create_mongo_client(uri).await?;
        let store = Self::new(client, database);
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Unique email index backing the duplicate-key check on signup.
    pub async fn ensure_indexes(&self) -> Result<(), ApiError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.tourists().create_index(index).await?;
        info!("Ensured unique email index on {}", TOURISTS);
        Ok(())
    }

    fn tourists(&self) -> Collection<Tourist> {
        self.db.collection(TOURISTS)
    }

    fn posts(&self) -> Collection<Post> {
        self.db.collection(POSTS)
    }

    fn contacts(&self) -> Collection<EmergencyContact> {
        self.db.collection(EMERGENCY_CONTACTS)
    }

    fn itineraries(&self) -> Collection<Itinerary> {
        self.db.collection(ITINERARIES)
    }

    /// Runs `pipeline` and pairs each row with the `creator_name` the
    /// `$lookup` stage attached.
    async fn joined<T>(&self, collection: &str, pipeline: Vec<Document>) -> Result<Vec<(T, String)>, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let docs: Vec<Document> = self
            .db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        docs.into_iter()
            .map(|doc| {
                let creator = doc.get_str("creator_name").unwrap_or_default().to_string();
                Ok((bson::from_document(doc)?, creator))
            })
            .collect()
    }
}

/// Inner join on `created_by -> tourists._id`, exposing the tourist's name.
fn creator_pipeline() -> Vec<Document> {
    vec![
        doc! { "$lookup": {
            "from": TOURISTS,
            "localField": "created_by",
            "foreignField": "_id",
            "as": "creator",
        }},
        doc! { "$unwind": "$creator" },
        doc! { "$addFields": { "creator_name": "$creator.name" } },
        doc! { "$project": { "creator": 0 } },
    ]
}

fn tourist_update(changes: &TouristChanges) -> Document {
    let mut set = doc! { "updated_at": bson::DateTime::now() };
    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(email) = &changes.email {
        set.insert("email", email.as_str());
    }
    if let Some(password) = &changes.password {
        set.insert("password", password.as_str());
    }
    if let Some(badge) = changes.badge {
        set.insert("badge", badge.as_str());
    }
    if let Some(bio) = &changes.bio {
        set.insert("bio", bio.as_str());
    }
    if let Some(path) = &changes.profile_image {
        set.insert("profile_image", path.as_str());
    }
    if let Some(path) = &changes.background_image {
        set.insert("background_image", path.as_str());
    }
    set
}

fn post_update(changes: &PostChanges) -> Document {
    let mut set = Document::new();
    if let Some(content) = &changes.content {
        set.insert("content", content.as_str());
    }
    if let Some(loc_link) = &changes.loc_link {
        set.insert("loc_link", loc_link.as_str());
    }
    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(image_url) = &changes.image_url {
        set.insert("image_url", image_url.as_str());
    }
    set
}

fn contact_update(changes: &ContactChanges) -> Document {
    let mut set = Document::new();
    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(phno) = &changes.phno {
        set.insert("phno", phno.as_str());
    }
    if let Some(loc) = &changes.loc {
        set.insert("loc", loc.as_str());
    }
    if let Some(latitude) = changes.latitude {
        set.insert("latitude", latitude);
    }
    if let Some(longitude) = changes.longitude {
        set.insert("longitude", longitude);
    }
    if let Some(link) = &changes.link {
        set.insert("link", link.clone());
    }
    set
}

fn inserted_id(result: mongodb::results::InsertOneResult) -> Result<ObjectId, ApiError> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::InternalError("Store returned a non-ObjectId key".to_string()))
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), ApiError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn list_tourists(&self) -> Result<Vec<Tourist>, ApiError> {
        let cursor = self.tourists().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_tourist(&self, id: &ObjectId) -> Result<Option<Tourist>, ApiError> {
        Ok(self.tourists().find_one(doc! { "_id": *id }).await?)
    }

    async fn insert_tourist(&self, tourist: &Tourist) -> Result<ObjectId, ApiError> {
        inserted_id(self.tourists().insert_one(tourist).await?)
    }

    async fn update_tourist(&self, id: &ObjectId, changes: &TouristChanges) -> Result<bool, ApiError> {
        let result = self
            .tourists()
            .update_one(doc! { "_id": *id }, doc! { "$set": tourist_update(changes) })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_tourist(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let result = self.tourists().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count_created_by(&self, id: &ObjectId) -> Result<u64, ApiError> {
        let posts = self.posts().count_documents(doc! { "created_by": *id }).await?;
        let contacts = self.contacts().count_documents(doc! { "created_by": *id }).await?;
        Ok(posts + contacts)
    }

    async fn list_posts(&self) -> Result<Vec<PostListing>, ApiError> {
        let rows = self.joined::<Post>(POSTS, creator_pipeline()).await?;
        Ok(rows
            .into_iter()
            .map(|(post, creator_name)| PostListing { post, creator_name })
            .collect())
    }

    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, ApiError> {
        Ok(self.posts().find_one(doc! { "_id": *id }).await?)
    }

    async fn insert_post(&self, post: &Post) -> Result<ObjectId, ApiError> {
        inserted_id(self.posts().insert_one(post).await?)
    }

    async fn update_post(&self, id: &ObjectId, changes: &PostChanges) -> Result<bool, ApiError> {
        let result = self
            .posts()
            .update_one(doc! { "_id": *id }, doc! { "$set": post_update(changes) })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_post(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let result = self.posts().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_contacts(&self) -> Result<Vec<ContactListing>, ApiError> {
        let rows = self
            .joined::<EmergencyContact>(EMERGENCY_CONTACTS, creator_pipeline())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(contact, creator)| ContactListing { contact, creator })
            .collect())
    }

    async fn insert_contact(&self, contact: &EmergencyContact) -> Result<ObjectId, ApiError> {
        inserted_id(self.contacts().insert_one(contact).await?)
    }

    async fn update_contact(&self, id: &ObjectId, changes: &ContactChanges) -> Result<bool, ApiError> {
        let result = self
            .contacts()
            .update_one(doc! { "_id": *id }, doc! { "$set": contact_update(changes) })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_contact(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let result = self.contacts().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError> {
        let cursor = self
            .itineraries()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_itinerary(&self, id: &ObjectId) -> Result<Option<Itinerary>, ApiError> {
        Ok(self.itineraries().find_one(doc! { "_id": *id }).await?)
    }

    async fn insert_itinerary(&self, itinerary: &Itinerary) -> Result<ObjectId, ApiError> {
        let result = self.itineraries().insert_one(itinerary).await.map_err(|err| {
            warn!("Failed to store itinerary for {}: {}", itinerary.destination, err);
            err
        })?;
        inserted_id(result)
    }

    async fn delete_itinerary(&self, id: &ObjectId) -> Result<bool, ApiError> {
        let result = self.itineraries().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }
}
