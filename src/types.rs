use crate::error::{Result, TimeTravelError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// GPS location with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Initial great-circle bearing from `self` towards `other`, in degrees
    /// normalized to `[0, 360)`. Used to point the viewer at the coordinates
    /// of interest on first load.
    pub fn heading_to(&self, other: Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let y = d_lng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }
}

/// Capture date of a panorama, at month/year granularity.
///
/// Parses from and displays as `"YYYY-MM"`. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaptureDate {
    pub year: i32,
    /// 1-based month (1 = January)
    pub month: u32,
}

impl CaptureDate {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(TimeTravelError::InvalidDate(format!("{year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// Months elapsed since year 0, treating the date as the first day of
    /// its month. Gives an exact absolute-difference metric at the
    /// month/year granularity the lookup service provides.
    fn month_index(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    /// Absolute distance to `other` in whole months.
    pub fn months_between(&self, other: CaptureDate) -> u64 {
        self.month_index().abs_diff(other.month_index())
    }

    /// User-visible `"Month Year"` label, e.g. `"March 2019"`.
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

impl FromStr for CaptureDate {
    type Err = TimeTravelError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || TimeTravelError::InvalidDate(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(bad)?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        CaptureDate::new(year, month).map_err(|_| bad())
    }
}

impl fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A single historical panorama at a location, as reported by the lookup
/// service. Read-only to this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanoramaRecord {
    /// Opaque panorama identifier
    pub pano_id: String,
    /// Geographic position of the capture
    pub position: Coordinates,
    /// Capture date, when the service reports one
    pub capture_date: Option<CaptureDate>,
}

/// Successful lookup payload: the resolved panorama plus the historical
/// imagery available at the same location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    /// Identifier of the resolved panorama
    pub pano_id: String,
    /// Position of the resolved panorama
    pub position: Coordinates,
    /// Capture date of the resolved panorama
    pub capture_date: Option<CaptureDate>,
    /// Historical panoramas sharing this location
    pub history: Vec<PanoramaRecord>,
}
