use crate::error::{Result, TimeTravelError};
use crate::types::{CaptureDate, Coordinates, LookupResponse, PanoramaRecord};
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const SEARCH_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/js/GeoPhotoService.SingleImageSearch";
const METADATA_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview/metadata";

/// Radius used when re-querying a resolved position for its history.
const HISTORY_RADIUS: u32 = 50;

/// A nearest-panorama lookup request.
#[derive(Debug, Clone, Copy)]
pub struct PanoRequest {
    /// Location to search around
    pub location: Coordinates,
    /// Search radius in meters
    pub radius: u32,
}

/// Panorama lookup service seam.
///
/// The controller only depends on this trait; [`StreetViewLookup`] is the
/// production implementation against Google's endpoints, and tests supply
/// fixture-backed fakes.
#[allow(async_fn_in_trait)]
pub trait PanoramaLookup {
    /// Find the panorama nearest to the requested location, within the
    /// request radius, together with the historical imagery at that spot.
    ///
    /// Returns [`TimeTravelError::NoPanorama`] when nothing is found within
    /// the radius.
    async fn find_nearest(&self, request: &PanoRequest) -> Result<LookupResponse>;

    /// Resolve a panorama by identifier, including the history available at
    /// its location.
    async fn by_id(&self, pano_id: &str) -> Result<LookupResponse>;
}

/// Lookup implementation backed by Google's Street View endpoints.
///
/// Nearest-panorama search uses an undocumented endpoint that needs no API
/// key. Resolving a panorama by identifier goes through the official
/// metadata endpoint and requires a key; use
/// [`with_api_key`](Self::with_api_key).
#[derive(Clone)]
pub struct StreetViewLookup {
    client: Client,
    api_key: Option<String>,
}

impl StreetViewLookup {
    /// Creates a lookup client without an API key.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_key: None,
        }
    }

    /// Creates a lookup client with a Google Maps API key, enabling
    /// [`by_id`](PanoramaLookup::by_id).
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
        }
    }

    /// Creates a lookup client with a custom reqwest Client, for proxies,
    /// timeouts, or custom headers.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            api_key: None,
        }
    }

    /// Attach an API key to an existing client.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for StreetViewLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl PanoramaLookup for StreetViewLookup {
    async fn find_nearest(&self, request: &PanoRequest) -> Result<LookupResponse> {
        let url = make_search_url(request.location, request.radius);
        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        let history = extract_history(&text)?;
        resolve_response(history)
    }

    async fn by_id(&self, pano_id: &str) -> Result<LookupResponse> {
        let api_key = self.api_key.as_ref().ok_or(TimeTravelError::MissingApiKey)?;
        let url = format!("{METADATA_ENDPOINT}?pano={pano_id}&key={api_key}");

        let response = self.client.get(&url).send().await?;
        let meta: MetaDataResponse = response.json().await?;
        debug!("Resolved pano {} ({:?})", meta.pano_id, meta.date);

        let position = Coordinates::new(meta.location.lat, meta.location.lng);
        let capture_date = match meta.date {
            Some(date) => Some(date.parse::<CaptureDate>()?),
            None => None,
        };

        // History comes from a search at the resolved position; the metadata
        // endpoint does not report it.
        let search = self
            .find_nearest(&PanoRequest {
                location: position,
                radius: HISTORY_RADIUS,
            })
            .await?;

        Ok(LookupResponse {
            pano_id: meta.pano_id,
            position,
            capture_date,
            history: search.history,
        })
    }
}

/// Internal structure for parsing the official metadata response.
#[derive(Debug, Deserialize)]
struct MetaDataResponse {
    date: Option<String>,
    location: LocationResponse,
    pano_id: String,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    lat: f64,
    lng: f64,
}

/// Build the search URL for a location and radius.
fn make_search_url(location: Coordinates, radius: u32) -> String {
    let Coordinates { lat, lng } = location;
    // This constructs the undocumented Google endpoint URL
    format!(
        "{SEARCH_ENDPOINT}?pb=!1m5!1sapiv3!5sUS!11m2!1m1!1b0!2m4!1m2!3d{lat}!4d{lng}!2d{radius}!3m18!2m2!1sen!2sUS!9m1!1e2!11m12!1m3!1e2!2b1!3e2!1m3!1e3!2b1!3e2!1m3!1e10!2b1!3e2!4m6!1e1!1e2!1e3!1e4!1e8!1e6&callback=callbackfunc"
    )
}

/// Extract the panorama history from Google's JavaScript callback response.
fn extract_history(text: &str) -> Result<Vec<PanoramaRecord>> {
    if text.contains("Search returned no images") {
        return Ok(Vec::new());
    }

    // Extract JSON from the JavaScript callback: callbackfunc(JSON_DATA)
    let re = Regex::new(r"callbackfunc\((.*)\)").unwrap();
    let json_str = re
        .captures(text)
        .and_then(|cap| cap.get(1))
        .ok_or_else(|| {
            TimeTravelError::ParseError("Could not extract JSON from response".to_string())
        })?
        .as_str();

    let data: Value = serde_json::from_str(json_str)
        .map_err(|e| TimeTravelError::ParseError(format!("JSON parse error: {e}")))?;

    // Panorama entries live at data[1][5][0][3][0]
    let pano_array = data
        .get(1)
        .and_then(|v| v.get(5))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get(3))
        .and_then(|v| v.get(0))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            TimeTravelError::InvalidResponse("Panorama data not found".to_string())
        })?;

    // Capture dates live at data[1][5][0][8], aligned index-wise with the
    // panorama entries. Each entry looks like [[...], [year, month]].
    let dates: Vec<Option<CaptureDate>> = data
        .get(1)
        .and_then(|v| v.get(5))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get(8))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .map(|d| {
                    let date_info = d.as_array()?.get(1)?.as_array()?;
                    let year = date_info.first()?.as_i64()?;
                    let month = date_info.get(1)?.as_i64()?;
                    CaptureDate::new(year as i32, month as u32).ok()
                })
                .collect()
        })
        .unwrap_or_default();

    let mut records = Vec::with_capacity(pano_array.len());

    for (idx, pano_data) in pano_array.iter().enumerate() {
        let pano_arr = pano_data.as_array().ok_or_else(|| {
            TimeTravelError::ParseError("Invalid panorama format".to_string())
        })?;

        let pano_id = pano_arr
            .first()
            .and_then(|v| v.get(1))
            .and_then(|v| v.as_str())
            .ok_or_else(|| TimeTravelError::ParseError("Missing pano_id".to_string()))?
            .to_string();

        // GPS coordinates are in pano_arr[2][0]
        let coords = pano_arr
            .get(2)
            .and_then(|v| v.get(0))
            .and_then(|v| v.as_array())
            .ok_or_else(|| TimeTravelError::ParseError("Missing coordinates".to_string()))?;

        let lat = coords
            .get(2)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| TimeTravelError::ParseError("Missing latitude".to_string()))?;

        let lng = coords
            .get(3)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| TimeTravelError::ParseError("Missing longitude".to_string()))?;

        records.push(PanoramaRecord {
            pano_id,
            position: Coordinates::new(lat, lng),
            capture_date: dates.get(idx).copied().flatten(),
        });
    }

    Ok(records)
}

/// Turn a raw history into a lookup response, resolving the most recently
/// captured entry as the primary panorama.
fn resolve_response(history: Vec<PanoramaRecord>) -> Result<LookupResponse> {
    if history.is_empty() {
        return Err(TimeTravelError::NoPanorama);
    }

    let primary = history
        .iter()
        .filter(|r| r.capture_date.is_some())
        .max_by_key(|r| r.capture_date)
        .unwrap_or(&history[0])
        .clone();

    Ok(LookupResponse {
        pano_id: primary.pano_id,
        position: primary.position,
        capture_date: primary.capture_date,
        history,
    })
}
