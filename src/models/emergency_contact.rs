use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::models::{parse_object_id, text_value};

const REQUIRED_FIELDS: [&str; 4] = ["name", "phno", "loc", "created_by"];
const UPDATABLE_FIELDS: [&str; 6] = ["name", "phno", "loc", "latitude", "longitude", "link"];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmergencyContact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phno: String,
    pub loc: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub link: Option<String>,
    pub created_by: ObjectId,
}

impl EmergencyContact {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let body = body
            .as_object()
            .ok_or_else(|| ApiError::InvalidInput("expected a JSON object".to_string()))?;
        if !REQUIRED_FIELDS.iter().all(|key| body.contains_key(*key)) {
            return Err(ApiError::MissingField("Missing required fields".to_string()));
        }

        let created_by = body
            .get("created_by")
            .and_then(text_value)
            .and_then(|raw| parse_object_id(&raw))
            .ok_or_else(|| ApiError::InvalidInput("Invalid created_by ID".to_string()))?;

        Ok(Self {
            id: None,
            name: required_text(body, "name")?,
            phno: required_text(body, "phno")?,
            loc: required_text(body, "loc")?,
            latitude: coordinate(body, "latitude")?.flatten(),
            longitude: coordinate(body, "longitude")?.flatten(),
            link: optional_text(body, "link")?.flatten(),
            created_by,
        })
    }
}

/// Partial update. The outer `Option` is "was the key sent"; the inner one
/// lets a client clear an optional column by sending `null`.
#[derive(Debug, Clone, Default)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub phno: Option<String>,
    pub loc: Option<String>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub link: Option<Option<String>>,
}

impl ContactChanges {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let body = body
            .as_object()
            .ok_or_else(|| ApiError::InvalidInput("expected a JSON object".to_string()))?;
        if !UPDATABLE_FIELDS.iter().any(|key| body.contains_key(*key)) {
            return Err(ApiError::MissingField("No fields to update".to_string()));
        }

        let text = |key: &str| match body.get(key) {
            Some(_) => required_text(body, key).map(Some),
            None => Ok(None),
        };

        Ok(Self {
            name: text("name")?,
            phno: text("phno")?,
            loc: text("loc")?,
            latitude: coordinate(body, "latitude")?,
            longitude: coordinate(body, "longitude")?,
            link: optional_text(body, "link")?,
        })
    }

    pub fn apply(&self, contact: &mut EmergencyContact) {
        if let Some(name) = &self.name {
            contact.name = name.clone();
        }
        if let Some(phno) = &self.phno {
            contact.phno = phno.clone();
        }
        if let Some(loc) = &self.loc {
            contact.loc = loc.clone();
        }
        if let Some(latitude) = self.latitude {
            contact.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            contact.longitude = longitude;
        }
        if let Some(link) = &self.link {
            contact.link = link.clone();
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContactListing {
    pub contact: EmergencyContact,
    pub creator: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: String,
    pub name: String,
    pub phno: String,
    pub loc: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub link: Option<String>,
    pub creator: String,
}

impl From<&ContactListing> for ContactResponse {
    fn from(listing: &ContactListing) -> Self {
        let contact = &listing.contact;
        Self {
            id: contact.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: contact.name.clone(),
            phno: contact.phno.clone(),
            loc: contact.loc.clone(),
            latitude: contact.latitude,
            longitude: contact.longitude,
            link: contact.link.clone(),
            creator: listing.creator.clone(),
        }
    }
}

fn required_text(body: &Map<String, Value>, key: &str) -> Result<String, ApiError> {
    body.get(key)
        .and_then(text_value)
        .ok_or_else(|| ApiError::InvalidInput(format!("{} must be a string", key)))
}

fn optional_text(body: &Map<String, Value>, key: &str) -> Result<Option<Option<String>>, ApiError> {
    match body.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(value) => text_value(value)
            .map(|text| Some(Some(text)))
            .ok_or_else(|| ApiError::InvalidInput(format!("{} must be a string", key))),
    }
}

fn coordinate(body: &Map<String, Value>, key: &str) -> Result<Option<Option<f64>>, ApiError> {
    let invalid = || ApiError::InvalidInput(format!("{} must be a number", key));
    match body.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::Number(n)) => n.as_f64().map(|v| Some(Some(v))).ok_or_else(invalid),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| Some(Some(v)))
            .ok_or_else(invalid),
        Some(_) => Err(invalid()),
    }
}
