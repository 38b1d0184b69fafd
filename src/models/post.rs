use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Post {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub created_at: bson::DateTime,
    pub created_by: ObjectId,
    pub content: String,
    pub loc_link: String,
    pub image_url: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub content: Option<String>,
    pub loc_link: Option<String>,
    pub title: Option<String>,
    pub image_url: Option<String>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.loc_link.is_none()
            && self.title.is_none()
            && self.image_url.is_none()
    }

    pub fn apply(&self, post: &mut Post) {
        if let Some(content) = &self.content {
            post.content = content.clone();
        }
        if let Some(loc_link) = &self.loc_link {
            post.loc_link = loc_link.clone();
        }
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(image_url) = &self.image_url {
            post.image_url = Some(image_url.clone());
        }
    }
}

/// A post joined with its creator's display name.
#[derive(Debug, Clone)]
pub struct PostListing {
    pub post: Post,
    pub creator_name: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub content: String,
    pub loc_link: String,
    pub image_url: Option<String>,
    pub title: String,
    pub creator_name: String,
}

impl From<&PostListing> for PostResponse {
    fn from(listing: &PostListing) -> Self {
        let post = &listing.post;
        Self {
            id: post.id.map(|id| id.to_hex()).unwrap_or_default(),
            created_at: post.created_at.to_chrono(),
            created_by: post.created_by.to_hex(),
            content: post.content.clone(),
            loc_link: post.loc_link.clone(),
            image_url: post.image_url.clone(),
            title: post.title.clone(),
            creator_name: listing.creator_name.clone(),
        }
    }
}
