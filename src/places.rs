//! Client for the places provider (Google Places web service).
//!
//! Three calls are used: nearby search for discovery, place details for the
//! check-in screen, and photo URLs for thumbnails. Responses are decoded
//! leniently: a missing name becomes "Unknown", a missing identifier leaves
//! the place listed but not check-in-able, and results without a location
//! are dropped.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::PlacesError;
use crate::geo::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const DEFAULT_RADIUS_M: u32 = 5000;
/// Place types treated as pubs.
pub const PUB_TYPES: &str = "bar|bar_and_grill|pub|irish_pub";
pub const PREVIEW_PHOTO_WIDTH: u32 = 400;
pub const DETAIL_PHOTO_WIDTH: u32 = 800;

const DETAIL_FIELDS: &str = "place_id,name,formatted_address,geometry,current_opening_hours,\
opening_hours,formatted_phone_number,website,price_level,rating,photos";

/// A place from a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Option<String>,
    pub name: String,
    pub location: Coordinate,
    pub rating: Option<f64>,
    pub open_now: Option<bool>,
    pub photo_reference: Option<String>,
    pub vicinity: Option<String>,
}

/// Extended fields from a place-details lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub id: String,
    pub name: String,
    pub location: Option<Coordinate>,
    pub formatted_address: Option<String>,
    pub opening_hours: Vec<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub price_level: Option<u8>,
    pub rating: Option<f64>,
    pub photo_references: Vec<String>,
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<RawPlace>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<RawPlace>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlace {
    place_id: Option<String>,
    name: Option<String>,
    geometry: Option<RawGeometry>,
    rating: Option<f64>,
    opening_hours: Option<RawOpeningHours>,
    current_opening_hours: Option<RawOpeningHours>,
    #[serde(default)]
    photos: Vec<RawPhoto>,
    vicinity: Option<String>,
    formatted_address: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
    price_level: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: RawLatLng,
}

#[derive(Debug, Deserialize)]
struct RawLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    photo_reference: String,
}

impl RawPlace {
    fn location(&self) -> Option<Coordinate> {
        self.geometry
            .as_ref()
            .map(|g| Coordinate::new(g.location.lat, g.location.lng))
    }

    fn into_place(self) -> Option<Place> {
        let location = self.location()?;
        Some(Place {
            id: self.place_id.filter(|id| !id.is_empty()),
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            location,
            rating: self.rating,
            open_now: self.opening_hours.as_ref().and_then(|h| h.open_now),
            photo_reference: self.photos.into_iter().next().map(|p| p.photo_reference),
            vicinity: self.vicinity,
        })
    }

    fn into_details(self, requested_id: &str) -> PlaceDetails {
        let location = self.location();
        let opening_hours = match (self.current_opening_hours, self.opening_hours) {
            (Some(current), _) if !current.weekday_text.is_empty() => current.weekday_text,
            (_, Some(regular)) => regular.weekday_text,
            _ => Vec::new(),
        };
        PlaceDetails {
            id: self.place_id.unwrap_or_else(|| requested_id.to_string()),
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            location,
            formatted_address: self.formatted_address,
            opening_hours,
            phone: self.formatted_phone_number,
            website: self.website,
            price_level: self.price_level,
            rating: self.rating,
            photo_references: self.photos.into_iter().map(|p| p.photo_reference).collect(),
        }
    }
}

fn check_status(status: Option<&str>, message: Option<String>) -> Result<(), PlacesError> {
    match status {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(()),
        Some(other) => Err(PlacesError::Status {
            status: other.to_string(),
            message,
        }),
    }
}

/// Decode a nearby-search response body.
pub fn parse_nearby(body: &str) -> Result<Vec<Place>, PlacesError> {
    let resp: NearbyResponse = serde_json::from_str(body)
        .map_err(|e| PlacesError::Other(anyhow::anyhow!("Malformed nearby response: {e}")))?;
    check_status(resp.status.as_deref(), resp.error_message)?;
    Ok(resp
        .results
        .into_iter()
        .filter_map(RawPlace::into_place)
        .collect())
}

/// Decode a place-details response body; `None` when the place is unknown.
pub fn parse_details(body: &str, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
    let resp: DetailsResponse = serde_json::from_str(body)
        .map_err(|e| PlacesError::Other(anyhow::anyhow!("Malformed details response: {e}")))?;
    match resp.status.as_deref() {
        Some("NOT_FOUND") | Some("INVALID_REQUEST") | Some("ZERO_RESULTS") => return Ok(None),
        status => check_status(status, resp.error_message)?,
    }
    Ok(resp.result.map(|raw| raw.into_details(place_id)))
}

/// Source of nearby places. `PlacesClient` is the real implementation.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn nearby(&self, center: Coordinate, radius_m: u32) -> Result<Vec<Place>, PlacesError>;
}

#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, PlacesError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PlacesError::MissingApiKey);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn nearby(
        &self,
        center: Coordinate,
        radius_m: u32,
    ) -> Result<Vec<Place>, PlacesError> {
        let body = self
            .http
            .get(format!("{}/nearbysearch/json", self.base_url))
            .query(&[
                ("location", center.to_query_value()),
                ("radius", radius_m.to_string()),
                ("type", PUB_TYPES.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let places = parse_nearby(&body)?;
        tracing::debug!(count = places.len(), radius_m, "nearby search");
        Ok(places)
    }

    pub async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        let body = self
            .http
            .get(format!("{}/details/json", self.base_url))
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_details(&body, place_id)
    }

    /// URL of a place photo scaled to `max_width` pixels.
    pub fn photo_url(&self, photo_reference: &str, max_width: u32) -> String {
        let mut url = match Url::parse(&format!("{}/photo", self.base_url)) {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        url.query_pairs_mut()
            .append_pair("maxwidth", &max_width.to_string())
            .append_pair("photo_reference", photo_reference)
            .append_pair("key", &self.api_key);
        url.to_string()
    }
}

#[async_trait]
impl PlaceSearch for PlacesClient {
    async fn nearby(&self, center: Coordinate, radius_m: u32) -> Result<Vec<Place>, PlacesError> {
        PlacesClient::nearby(self, center, radius_m).await
    }
}

/// Link that opens turn-by-turn directions to a place.
pub fn directions_url(destination: Coordinate, label: Option<&str>) -> String {
    let mut target = destination.to_query_value();
    if let Some(label) = label {
        target.push_str(&format!("({label})"));
    }
    match Url::parse_with_params(
        "https://www.google.com/maps/dir/",
        &[("api", "1"), ("destination", target.as_str())],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => String::new(),
    }
}

pub fn format_price_level(level: Option<u8>) -> &'static str {
    match level {
        Some(0) => "Free",
        Some(1) => "€",
        Some(2) => "€€",
        Some(3) => "€€€",
        Some(4) => "€€€€",
        _ => "Price unknown",
    }
}

pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("⭐ {r:.1}"),
        None => "No rating".to_string(),
    }
}
