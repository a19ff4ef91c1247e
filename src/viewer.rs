use crate::options::DateOption;
use crate::types::Coordinates;

/// Camera orientation for the panorama viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOfView {
    /// Heading in degrees (0-360)
    pub heading: f64,
    /// Pitch in degrees (-90 to 90)
    pub pitch: f64,
}

/// Initial configuration for the panorama viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Panorama to display first
    pub pano_id: String,
    /// Position of interest
    pub position: Coordinates,
    /// Viewer zoom level
    pub zoom: u8,
    /// Initial camera orientation
    pub pov: PointOfView,
    /// Show the viewer's own capture-date control
    pub date_control: bool,
    /// Show the fullscreen control
    pub fullscreen_control: bool,
}

/// Base map style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapStyle {
    Satellite,
    Roadmap,
}

/// Configuration for the companion map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Map center
    pub center: Coordinates,
    /// Map zoom level
    pub zoom: u8,
    /// Base imagery style
    pub style: MapStyle,
}

/// Panorama viewer seam.
///
/// The host implements this over its rendering toolkit. The controller
/// reads the current panorama through [`pano`](Self::pano), reassigns it
/// through [`set_pano`](Self::set_pano) during the pegman correction flow,
/// and falls back to [`show_message`](Self::show_message) when the initial
/// lookup finds nothing.
pub trait PanoramaViewer {
    fn configure(&mut self, config: ViewerConfig);
    /// Identifier of the currently displayed panorama.
    fn pano(&self) -> String;
    /// Force the viewer onto a specific panorama.
    fn set_pano(&mut self, pano_id: &str);
    /// Replace the viewer surface with a static text message.
    fn show_message(&mut self, text: &str);
}

/// Companion map seam. The map emits a one-shot ready/idle notification
/// that the host forwards to
/// [`handle_map_idle`](crate::TimeTravelController::handle_map_idle).
pub trait MapSurface {
    fn configure(&mut self, config: MapConfig);
    /// Bind the map to the panorama viewer so pegman drops land in it.
    fn bind_street_view(&mut self);
}

/// Date-selection list seam.
pub trait DateSelect {
    /// Replace the list contents with fresh entries.
    fn replace_options(&mut self, options: &[DateOption]);
    /// Toggle visibility of the control's wrapper.
    fn set_visible(&mut self, visible: bool);
}
