pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::errors::ApiError;
use crate::models::{
    emergency_contact::{ContactChanges, ContactListing, EmergencyContact},
    itinerary::Itinerary,
    post::{Post, PostChanges, PostListing},
    tourist::{Tourist, TouristChanges},
};

/// Persistence seam for the handlers. Every method is a single statement
/// against the backing store; nothing spans more than one write.
///
/// `update_*` and `delete_*` return `false` when no row matched the id.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), ApiError>;

    async fn list_tourists(&self) -> Result<Vec<Tourist>, ApiError>;
    async fn find_tourist(&self, id: &ObjectId) -> Result<Option<Tourist>, ApiError>;
    /// Fails with `DuplicateKey` when the email is taken.
    async fn insert_tourist(&self, tourist: &Tourist) -> Result<ObjectId, ApiError>;
    async fn update_tourist(&self, id: &ObjectId, changes: &TouristChanges) -> Result<bool, ApiError>;
    async fn delete_tourist(&self, id: &ObjectId) -> Result<bool, ApiError>;
    /// Posts plus emergency contacts whose `created_by` is `id`.
    async fn count_created_by(&self, id: &ObjectId) -> Result<u64, ApiError>;

    /// Posts whose creator no longer exists are left out.
    async fn list_posts(&self) -> Result<Vec<PostListing>, ApiError>;
    async fn find_post(&self, id: &ObjectId) -> Result<Option<Post>, ApiError>;
    async fn insert_post(&self, post: &Post) -> Result<ObjectId, ApiError>;
    async fn update_post(&self, id: &ObjectId, changes: &PostChanges) -> Result<bool, ApiError>;
    async fn delete_post(&self, id: &ObjectId) -> Result<bool, ApiError>;

    async fn list_contacts(&self) -> Result<Vec<ContactListing>, ApiError>;
    async fn insert_contact(&self, contact: &EmergencyContact) -> Result<ObjectId, ApiError>;
    async fn update_contact(&self, id: &ObjectId, changes: &ContactChanges) -> Result<bool, ApiError>;
    async fn delete_contact(&self, id: &ObjectId) -> Result<bool, ApiError>;

    /// Newest first.
    async fn list_itineraries(&self) -> Result<Vec<Itinerary>, ApiError>;
    async fn find_itinerary(&self, id: &ObjectId) -> Result<Option<Itinerary>, ApiError>;
    async fn insert_itinerary(&self, itinerary: &Itinerary) -> Result<ObjectId, ApiError>;
    async fn delete_itinerary(&self, id: &ObjectId) -> Result<bool, ApiError>;
}
