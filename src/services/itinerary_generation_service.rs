use log::{info, warn};
use mongodb::bson;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::sync::Arc;

use crate::db::Store;
use crate::errors::ApiError;
use crate::models::itinerary::{Itinerary, ItineraryRequest};
use crate::services::generation::TextGenerator;

pub const SYSTEM_PROMPT: &str = "You are a professional travel planner with expertise in creating \
detailed itineraries. You must respond with valid JSON only, with no additional text. You must \
include activities for all days of the trip.";

const BUDGET_CATEGORIES: [&str; 5] = [
    "transportation",
    "accommodation",
    "activities",
    "food",
    "miscellaneous",
];

pub struct ItineraryGenerator {
    store: Arc<dyn Store>,
    generator: Arc<dyn TextGenerator>,
}

impl ItineraryGenerator {
    pub fn new(store: Arc<dyn Store>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    /// Prompt, call, validate, then persist. Nothing is written unless the
    /// reply parses and covers every requested day.
    pub async fn generate(&self, request: &ItineraryRequest) -> Result<(ObjectId, Value), ApiError> {
        info!(
            "Generating {}-day itinerary from {} to {} with budget {}",
            request.days, request.source, request.destination, request.budget
        );

        let prompt = build_prompt(request);
        let reply = self.generator.generate(SYSTEM_PROMPT, &prompt).await?;
        let document = validate_itinerary(&reply, request.days)?;

        let itinerary = Itinerary {
            id: None,
            budget: request.budget,
            source: request.source.clone(),
            destination: request.destination.clone(),
            days: request.days,
            preferences: request.preferences.clone(),
            itinerary_data: document,
            created_at: bson::DateTime::now(),
        };
        let id = self.store.insert_itinerary(&itinerary).await?;
        info!("Stored itinerary {}", id);

        Ok((id, itinerary.itinerary_data))
    }
}

fn schema_template(request: &ItineraryRequest) -> String {
    let categories = BUDGET_CATEGORIES
        .iter()
        .map(|name| format!(r#"            {{"category": "{}", "amount": 0, "percentage": 0}}"#, name))
        .collect::<Vec<_>>()
        .join(",\n");
    let days = (1..=request.days)
        .map(|day| format!(r#"        {{"day": {}, "activities": []}}"#, day))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"{{
    "summary": "Brief overview of the trip",
    "budget_breakdown": {{
        "total": {budget},
        "categories": [
{categories}
        ]
    }},
    "daily_itinerary": [
{days}
    ],
    "restaurant_recommendations": [],
    "transportation_details": [],
    "emergency_info": {{
        "police": "number",
        "ambulance": "number",
        "fire": "number",
        "embassy": "address and number",
        "hospital": "address and number"
    }},
    "local_tips": [],
    "cultural_notes": []
}}"#,
        budget = request.budget,
        categories = categories,
        days = days,
    )
}

/// Renders the user prompt. Same request, same prompt.
pub fn build_prompt(request: &ItineraryRequest) -> String {
    let days = request.days;
    let budget = request.budget;

    format!(
        "Create a detailed {days}-day travel itinerary from {source} to {destination} with a budget of ₹{budget}.
Preferences: {preferences}.

IMPORTANT REQUIREMENTS:
1. You MUST create activities for ALL {days} days of the trip
2. Each day must have at least 3-4 activities
3. Activities should be spread throughout the day (morning, afternoon, evening)
4. Include realistic time slots and durations
5. Ensure the total cost stays within the budget of ₹{budget}

Include in your response:
1. Daily schedule with time slots for ALL days
2. Cost estimates for each activity
3. Transportation details
4. Restaurant recommendations
5. Must-see attractions
6. Budget breakdown
7. Local tips and cultural notes
8. Emergency contacts and important numbers

Your response MUST be a valid JSON object with the following structure:
{schema}

IMPORTANT:
1. You MUST include activities for ALL {days} days in the daily_itinerary array
2. Each day must have at least 3-4 activities
3. Do not include any text before or after the JSON object
4. The response must be valid JSON that can be parsed directly",
        days = days,
        source = request.source,
        destination = request.destination,
        budget = budget,
        preferences = request.preferences.join(", "),
        schema = schema_template(request),
    )
}

/// Strips surrounding whitespace and a Markdown code fence, if any.
pub fn sanitize_response(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parses the generation reply and enforces one `daily_itinerary` entry per
/// requested day.
pub fn validate_itinerary(reply: &str, days: u32) -> Result<Value, ApiError> {
    let cleaned = sanitize_response(reply);

    let document: Value = serde_json::from_str(cleaned).map_err(|e| {
        warn!("Generation reply is not valid JSON: {}", e);
        ApiError::MalformedResponse {
            details: e.to_string(),
            raw_response: cleaned.to_string(),
        }
    })?;

    let found = document
        .get("daily_itinerary")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    if found != days as usize {
        warn!("Expected {} days but got {} days", days, found);
        return Err(ApiError::IncompleteItinerary {
            expected: days,
            found,
            raw_response: cleaned.to_string(),
        });
    }

    Ok(document)
}
