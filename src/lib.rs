//! # sv-timetravel
//!
//! An async Rust controller for "time traveling" through historical Google
//! Street View panoramas at a fixed location.
//!
//! This library provides:
//! - Nearest-panorama lookup with historical imagery, via Google's endpoints
//! - A closest-date option builder for a date-selection list
//! - Detection of the map toolkit's pegman drag handle
//! - An event-driven controller that suppresses duplicate change
//!   notifications and, after a pegman drop drifts the capture date,
//!   repositions to the panorama closest to the previously viewed date
//!
//! Rendering is not done here: the panorama viewer, the companion map, and
//! the date-selection list are traits the host implements over its own UI
//! toolkit, forwarding that toolkit's events to the controller.
//!
//! ## Example
//!
//! ```no_run
//! use sv_timetravel::{Coordinates, PanoRequest, PanoramaLookup, StreetViewLookup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = StreetViewLookup::new();
//!
//!     let request = PanoRequest {
//!         location: Coordinates::new(45.4580915864, -73.5754052827),
//!         radius: 25,
//!     };
//!     let found = lookup.find_nearest(&request).await?;
//!
//!     println!("Nearest panorama: {} ({:?})", found.pano_id, found.capture_date);
//!     for record in &found.history {
//!         println!("  {} - {:?}", record.pano_id, record.capture_date);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod controller;
mod error;
mod lookup;
mod options;
mod pegman;
mod types;
mod viewer;

pub use controller::{SelectionState, TimeTravelController, DEFAULT_RADIUS};
pub use error::{Result, TimeTravelError};
pub use lookup::{PanoRequest, PanoramaLookup, StreetViewLookup};
pub use options::{time_travel_options, DateOption, TimeTravelOptions};
pub use pegman::{ObservedNode, PegmanDetector, PEGMAN_SIGNATURE};
pub use types::{CaptureDate, Coordinates, LookupResponse, PanoramaRecord};
pub use viewer::{
    DateSelect, MapConfig, MapStyle, MapSurface, PanoramaViewer, PointOfView, ViewerConfig,
};
