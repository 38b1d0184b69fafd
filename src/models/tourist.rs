use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Lvl0,
    Lvl1,
    Lvl2,
    Lvl3,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Lvl0 => "lvl0",
            Badge::Lvl1 => "lvl1",
            Badge::Lvl2 => "lvl2",
            Badge::Lvl3 => "lvl3",
        }
    }
}

impl FromStr for Badge {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lvl0" => Ok(Badge::Lvl0),
            "lvl1" => Ok(Badge::Lvl1),
            "lvl2" => Ok(Badge::Lvl2),
            "lvl3" => Ok(Badge::Lvl3),
            _ => Err(ApiError::InvalidEnum("Invalid badge value".to_string())),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tourist {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String, // Always hashed
    pub badge: Badge,
    pub profile_image: Option<String>,
    pub background_image: Option<String>,
    pub bio: Option<String>,
    pub created_at: Option<bson::DateTime>,
    pub updated_at: Option<bson::DateTime>,
}

impl Tourist {
    /// Public paths of every uploaded file the row points at.
    pub fn image_paths(&self) -> Vec<&str> {
        [&self.profile_image, &self.background_image]
            .into_iter()
            .filter_map(|path| path.as_deref())
            .collect()
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct TouristChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub badge: Option<Badge>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub background_image: Option<String>,
}

impl TouristChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.badge.is_none()
            && self.bio.is_none()
            && self.profile_image.is_none()
            && self.background_image.is_none()
    }

    pub fn apply(&self, tourist: &mut Tourist) {
        if let Some(name) = &self.name {
            tourist.name = name.clone();
        }
        if let Some(email) = &self.email {
            tourist.email = email.clone();
        }
        if let Some(password) = &self.password {
            tourist.password = password.clone();
        }
        if let Some(badge) = self.badge {
            tourist.badge = badge;
        }
        if let Some(bio) = &self.bio {
            tourist.bio = Some(bio.clone());
        }
        if let Some(path) = &self.profile_image {
            tourist.profile_image = Some(path.clone());
        }
        if let Some(path) = &self.background_image {
            tourist.background_image = Some(path.clone());
        }
    }
}

/// What clients see of a tourist. The password hash never leaves the store.
#[derive(Debug, Serialize)]
pub struct TouristResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub badge: Badge,
    pub profile_image: Option<String>,
    pub background_image: Option<String>,
    pub bio: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Tourist> for TouristResponse {
    fn from(tourist: &Tourist) -> Self {
        Self {
            id: tourist.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: tourist.name.clone(),
            email: tourist.email.clone(),
            badge: tourist.badge,
            profile_image: tourist.profile_image.clone(),
            background_image: tourist.background_image.clone(),
            bio: tourist.bio.clone(),
            created_at: tourist.created_at.map(|at| at.to_chrono()),
        }
    }
}
