use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

const REQUIRED_FIELDS: [&str; 5] = ["budget", "source", "destination", "days", "preferences"];

/// Longest trip the generator will plan. The prompt and the stored document
/// both grow with the day count.
pub const MAX_DAYS: u32 = 30;

/// Validated trip parameters for `POST /itinerary`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryRequest {
    pub budget: f64,
    pub source: String,
    pub destination: String,
    pub days: u32,
    pub preferences: Vec<String>,
}

impl ItineraryRequest {
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let body = body
            .as_object()
            .ok_or_else(|| ApiError::InvalidInput("expected a JSON object".to_string()))?;
        if !REQUIRED_FIELDS.iter().all(|key| body.contains_key(*key)) {
            return Err(ApiError::MissingField("Missing required fields".to_string()));
        }

        Ok(Self {
            budget: parse_budget(&body["budget"])?,
            source: parse_place(&body["source"], "source")?,
            destination: parse_place(&body["destination"], "destination")?,
            days: parse_days(&body["days"])?,
            preferences: parse_preferences(&body["preferences"])?,
        })
    }
}

fn parse_budget(value: &Value) -> Result<f64, ApiError> {
    let budget = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    budget
        .filter(|b| b.is_finite() && *b > 0.0)
        .ok_or_else(|| ApiError::InvalidInput("budget must be a positive number".to_string()))
}

fn parse_days(value: &Value) -> Result<u32, ApiError> {
    let days = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    let days = days
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d >= 1)
        .ok_or_else(|| ApiError::InvalidInput("days must be a positive integer".to_string()))?;
    if days > MAX_DAYS {
        return Err(ApiError::InvalidInput(format!(
            "days must be at most {}",
            MAX_DAYS
        )));
    }
    Ok(days)
}

fn parse_place(value: &Value, field: &str) -> Result<String, ApiError> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidInput(format!("{} must be a non-empty string", field)))
}

fn parse_preferences(value: &Value) -> Result<Vec<String>, ApiError> {
    let invalid = || ApiError::InvalidInput("preferences must be a list of strings".to_string());
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

/// Stored itinerary. `itinerary_data` is the validated generation output.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Itinerary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub budget: f64,
    pub source: String,
    pub destination: String,
    pub days: u32,
    pub preferences: Vec<String>,
    pub itinerary_data: Value,
    pub created_at: bson::DateTime,
}

#[derive(Debug, Serialize)]
pub struct ItinerarySummary {
    pub id: String,
    pub budget: f64,
    pub source: String,
    pub destination: String,
    pub days: u32,
    pub preferences: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Itinerary> for ItinerarySummary {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            id: itinerary.id.map(|id| id.to_hex()).unwrap_or_default(),
            budget: itinerary.budget,
            source: itinerary.source.clone(),
            destination: itinerary.destination.clone(),
            days: itinerary.days,
            preferences: itinerary.preferences.clone(),
            created_at: itinerary.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItineraryDetail {
    #[serde(flatten)]
    pub summary: ItinerarySummary,
    pub itinerary: Value,
}

impl From<&Itinerary> for ItineraryDetail {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            summary: ItinerarySummary::from(itinerary),
            itinerary: itinerary.itinerary_data.clone(),
        }
    }
}
