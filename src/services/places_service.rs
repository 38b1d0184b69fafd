use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    vicinity: Option<String>,
    geometry: Geometry,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    pub address: Option<String>,
    pub location: LatLng,
    pub place_id: Option<String>,
}

#[derive(Debug)]
pub enum PlacesError {
    EnvironmentError(String),
    HttpError(reqwest::Error),
}

impl fmt::Display for PlacesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacesError::EnvironmentError(msg) => write!(f, "Environment error: {}", msg),
            PlacesError::HttpError(err) => write!(f, "HTTP error: {}", err),
        }
    }
}

impl std::error::Error for PlacesError {}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        PlacesError::HttpError(err)
    }
}

/// Passthrough to the Places "nearby search" endpoint.
pub struct PlacesService {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl PlacesService {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, PlacesError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// Nearest place of `place_type` around `lat,lng`, ranked by distance.
    /// The API rejects `radius` alongside `rankby=distance`, so none is sent.
    pub async fn nearest(
        &self,
        lat: &str,
        lng: &str,
        place_type: &str,
    ) -> Result<Option<NearbyPlace>, PlacesError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PlacesError::EnvironmentError("GOOGLE_MAPS_API_KEY not set".to_string()))?;

        let location = format!("{},{}", lat, lng);
        info!("Nearby search for {} around {}", place_type, location);

        let response: NearbySearchResponse = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("location", location.as_str()),
                ("type", place_type),
                ("rankby", "distance"),
                ("key", api_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(nearest_place(response))
    }
}

/// Takes the first result as-is; ordering is whatever the ranking returned.
fn nearest_place(response: NearbySearchResponse) -> Option<NearbyPlace> {
    if response.status != "OK" {
        return None;
    }
    response.results.into_iter().next().map(|place| NearbyPlace {
        name: place.name,
        address: place.vicinity,
        location: place.geometry.location,
        place_id: place.place_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> NearbySearchResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn first_result_wins() {
        let response = parse(
            r#"{"status":"OK","results":[
                {"name":"GMC Hospital","vicinity":"Bambolim","geometry":{"location":{"lat":15.46,"lng":73.86}},"place_id":"abc"},
                {"name":"Other","vicinity":"Far","geometry":{"location":{"lat":1.0,"lng":2.0}}}
            ]}"#,
        );
        let place = nearest_place(response).unwrap();
        assert_eq!(place.name, "GMC Hospital");
        assert_eq!(place.address.as_deref(), Some("Bambolim"));
        assert_eq!(place.location, LatLng { lat: 15.46, lng: 73.86 });
        assert_eq!(place.place_id.as_deref(), Some("abc"));
    }

    #[test]
    fn zero_results_or_bad_status_yield_nothing() {
        assert!(nearest_place(parse(r#"{"status":"ZERO_RESULTS","results":[]}"#)).is_none());
        assert!(nearest_place(parse(r#"{"status":"REQUEST_DENIED"}"#)).is_none());
        assert!(nearest_place(parse(r#"{"status":"OK","results":[]}"#)).is_none());
    }

    #[actix_rt::test]
    async fn missing_key_is_reported() {
        let service = PlacesService::new(None, "http://127.0.0.1:9/nearby").unwrap();
        assert!(matches!(
            service.nearest("15.4", "73.8", "hospital").await,
            Err(PlacesError::EnvironmentError(_))
        ));
    }
}
