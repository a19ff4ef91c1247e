use crate::error::{Result, TimeTravelError};
use crate::lookup::{PanoRequest, PanoramaLookup};
use crate::options::time_travel_options;
use crate::types::{CaptureDate, Coordinates, LookupResponse};
use crate::viewer::{
    DateSelect, MapConfig, MapStyle, MapSurface, PanoramaViewer, PointOfView, ViewerConfig,
};
use log::{debug, warn};
use std::time::Duration;

/// Default nearest-panorama search radius in meters.
pub const DEFAULT_RADIUS: u32 = 25;

const VIEWER_ZOOM: u8 = 0;
const MAP_ZOOM: u8 = 18;

/// Last accepted panorama plus the transient pegman drag flags.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    last_pano_id: Option<String>,
    last_pano_date: Option<CaptureDate>,
    drag_in_progress: bool,
    drop_completed: bool,
}

impl SelectionState {
    /// Identifier of the last accepted panorama.
    pub fn last_pano_id(&self) -> Option<&str> {
        self.last_pano_id.as_deref()
    }

    /// Capture date of the last accepted panorama.
    pub fn last_pano_date(&self) -> Option<CaptureDate> {
        self.last_pano_date
    }
}

#[derive(Debug, Clone)]
enum CorrectionState {
    Idle,
    Awaiting { target: String },
}

/// Time-travel panorama controller.
///
/// Owns the [`SelectionState`] and drives the four collaborator seams. The
/// host constructs it, calls [`bootstrap`](Self::bootstrap) once, and then
/// forwards toolkit events: panorama-change notifications to
/// [`handle_pano_changed`](Self::handle_pano_changed), the map's one-shot
/// idle notification to [`handle_map_idle`](Self::handle_map_idle), and
/// press/release on the hooked pegman node to
/// [`handle_pegman_press`](Self::handle_pegman_press) /
/// [`handle_pegman_release`](Self::handle_pegman_release).
pub struct TimeTravelController<L, V, M, S> {
    lookup: L,
    viewer: V,
    map: M,
    select: S,
    coordinates: Coordinates,
    radius: u32,
    state: SelectionState,
    correction: CorrectionState,
    revealed: bool,
}

impl<L, V, M, S> TimeTravelController<L, V, M, S>
where
    L: PanoramaLookup,
    V: PanoramaViewer,
    M: MapSurface,
    S: DateSelect,
{
    pub fn new(lookup: L, viewer: V, map: M, select: S, coordinates: Coordinates) -> Self {
        Self {
            lookup,
            viewer,
            map,
            select,
            coordinates,
            radius: DEFAULT_RADIUS,
            state: SelectionState::default(),
            correction: CorrectionState::Idle,
            revealed: false,
        }
    }

    /// Override the nearest-panorama search radius (meters).
    pub fn radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn selection(&self) -> &SelectionState {
        &self.state
    }

    /// Find the nearest panorama and stand up the viewer, map, and date
    /// list. A lookup miss is terminal for this session: a static message
    /// replaces the viewer and no retry is attempted.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let request = PanoRequest {
            location: self.coordinates,
            radius: self.radius,
        };
        let data = match self.lookup.find_nearest(&request).await {
            Ok(data) => data,
            Err(TimeTravelError::NoPanorama) => {
                self.viewer.show_message(&format!(
                    "Could not find panorama within {}m of coordinates",
                    self.radius
                ));
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        debug!("Panorama found: {}", data.pano_id);

        let heading = data.position.heading_to(self.coordinates);
        self.viewer.configure(ViewerConfig {
            pano_id: data.pano_id.clone(),
            position: self.coordinates,
            zoom: VIEWER_ZOOM,
            pov: PointOfView {
                heading,
                pitch: 0.0,
            },
            date_control: true,
            fullscreen_control: false,
        });
        self.map.configure(MapConfig {
            center: self.coordinates,
            zoom: MAP_ZOOM,
            style: MapStyle::Satellite,
        });
        self.map.bind_street_view();

        self.refresh_options(&data);
        Ok(())
    }

    /// One-shot reveal of the date-selection control, timed to the map's
    /// ready/idle notification.
    pub fn handle_map_idle(&mut self) {
        if !self.revealed {
            self.revealed = true;
            self.select.set_visible(true);
        }
    }

    pub fn handle_pegman_press(&mut self) {
        debug!("pegman press");
        self.state.drop_completed = false;
        self.state.drag_in_progress = true;
    }

    pub fn handle_pegman_release(&mut self) {
        debug!("pegman release");
        if self.state.drag_in_progress {
            self.state.drag_in_progress = false;
            self.state.drop_completed = true;
        }
    }

    /// React to a panorama-change notification from the viewer.
    ///
    /// Duplicate notifications for the recorded panorama are ignored. A
    /// change that lands right after a pegman drop and drifts away from the
    /// previously viewed date does not refresh the list; instead the
    /// historical panorama closest to the previous date becomes the pending
    /// correction target and the correction signal is raised. Every other
    /// change refreshes the list and the selection state.
    pub async fn handle_pano_changed(&mut self) -> Result<()> {
        if matches!(self.correction, CorrectionState::Awaiting { .. }) {
            debug!("Change notification while a correction is pending");
            return self.handle_correction_needed().await;
        }

        let new_id = self.viewer.pano();
        if self.state.last_pano_id.as_deref() == Some(new_id.as_str()) {
            debug!("Extra event on {new_id}, ignoring");
            return Ok(());
        }

        let data = self.lookup.by_id(&new_id).await?;
        debug!(
            "New pano {} ({:?}), last {:?} ({:?})",
            data.pano_id, data.capture_date, self.state.last_pano_id, self.state.last_pano_date
        );

        if self.state.drop_completed {
            // Consumed by this change whether or not a correction is due; a
            // stale flag would trigger a false correction on a later change.
            self.state.drop_completed = false;

            if let Some(previous) = self.state.last_pano_date {
                if data.capture_date != Some(previous) {
                    match time_travel_options(&data.history, previous) {
                        Ok(built) => {
                            debug!(
                                "Pegman drop drifted; will change to closest pano {} ({})",
                                built.closest_pano_id, built.closest_date
                            );
                            self.correction = CorrectionState::Awaiting {
                                target: built.closest_pano_id,
                            };
                            return self.handle_correction_needed().await;
                        }
                        Err(e) => warn!("Could not compute correction target: {e}"),
                    }
                }
            }
        }

        self.refresh_options(&data);
        Ok(())
    }

    /// Apply a pending correction: defer one zero-delay tick so the viewer
    /// finishes dispatching the current change, then force the panorama to
    /// the recorded target. The selection state is updated by the follow-up
    /// change notification, not here.
    pub async fn handle_correction_needed(&mut self) -> Result<()> {
        let target = match std::mem::replace(&mut self.correction, CorrectionState::Idle) {
            CorrectionState::Awaiting { target } => target,
            CorrectionState::Idle => return Ok(()),
        };

        tokio::time::sleep(Duration::ZERO).await;

        debug!("Changing pano to {target}");
        self.viewer.set_pano(&target);
        Ok(())
    }

    /// Rebuild the date list around `data`'s capture date and record the
    /// panorama as the last accepted one. Entries without dates degrade
    /// best-effort: an entirely undated history leaves the previous list in
    /// place.
    fn refresh_options(&mut self, data: &LookupResponse) {
        let target = data
            .capture_date
            .or_else(|| data.history.iter().filter_map(|r| r.capture_date).max());
        let Some(target) = target else {
            warn!("No capture date available for pano {}", data.pano_id);
            self.state.last_pano_id = Some(data.pano_id.clone());
            self.state.last_pano_date = None;
            return;
        };

        match time_travel_options(&data.history, target) {
            Ok(built) => self.select.replace_options(&built.options),
            Err(e) => warn!("No selectable dates for pano {}: {e}", data.pano_id),
        }

        self.state.last_pano_id = Some(data.pano_id.clone());
        self.state.last_pano_date = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DateOption;
    use crate::types::PanoramaRecord;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    const HERE: Coordinates = Coordinates {
        lat: 45.4580915864,
        lng: -73.5754052827,
    };

    fn record(pano_id: &str, date: &str) -> PanoramaRecord {
        PanoramaRecord {
            pano_id: pano_id.to_string(),
            position: HERE,
            capture_date: Some(date.parse().unwrap()),
        }
    }

    fn response(pano_id: &str, date: &str, history: Vec<PanoramaRecord>) -> LookupResponse {
        LookupResponse {
            pano_id: pano_id.to_string(),
            position: HERE,
            capture_date: Some(date.parse().unwrap()),
            history,
        }
    }

    #[derive(Default)]
    struct LookupInner {
        nearest: Option<LookupResponse>,
        by_id: HashMap<String, LookupResponse>,
        nearest_calls: usize,
        by_id_calls: usize,
    }

    #[derive(Clone, Default)]
    struct FakeLookup(Rc<RefCell<LookupInner>>);

    impl PanoramaLookup for FakeLookup {
        async fn find_nearest(&self, _request: &PanoRequest) -> Result<LookupResponse> {
            let mut inner = self.0.borrow_mut();
            inner.nearest_calls += 1;
            inner.nearest.clone().ok_or(TimeTravelError::NoPanorama)
        }

        async fn by_id(&self, pano_id: &str) -> Result<LookupResponse> {
            let mut inner = self.0.borrow_mut();
            inner.by_id_calls += 1;
            inner
                .by_id
                .get(pano_id)
                .cloned()
                .ok_or_else(|| TimeTravelError::InvalidResponse(format!("unknown pano {pano_id}")))
        }
    }

    #[derive(Default)]
    struct ViewerInner {
        pano: String,
        set_calls: Vec<String>,
        messages: Vec<String>,
        config: Option<ViewerConfig>,
    }

    #[derive(Clone, Default)]
    struct FakeViewer(Rc<RefCell<ViewerInner>>);

    impl PanoramaViewer for FakeViewer {
        fn configure(&mut self, config: ViewerConfig) {
            let mut inner = self.0.borrow_mut();
            inner.pano = config.pano_id.clone();
            inner.config = Some(config);
        }

        fn pano(&self) -> String {
            self.0.borrow().pano.clone()
        }

        fn set_pano(&mut self, pano_id: &str) {
            let mut inner = self.0.borrow_mut();
            inner.pano = pano_id.to_string();
            inner.set_calls.push(pano_id.to_string());
        }

        fn show_message(&mut self, text: &str) {
            self.0.borrow_mut().messages.push(text.to_string());
        }
    }

    #[derive(Default)]
    struct MapInner {
        config: Option<MapConfig>,
        bound: bool,
    }

    #[derive(Clone, Default)]
    struct FakeMap(Rc<RefCell<MapInner>>);

    impl MapSurface for FakeMap {
        fn configure(&mut self, config: MapConfig) {
            self.0.borrow_mut().config = Some(config);
        }

        fn bind_street_view(&mut self) {
            self.0.borrow_mut().bound = true;
        }
    }

    #[derive(Default)]
    struct SelectInner {
        replaced: Vec<Vec<DateOption>>,
        visible: Option<bool>,
    }

    #[derive(Clone, Default)]
    struct FakeSelect(Rc<RefCell<SelectInner>>);

    impl DateSelect for FakeSelect {
        fn replace_options(&mut self, options: &[DateOption]) {
            self.0.borrow_mut().replaced.push(options.to_vec());
        }

        fn set_visible(&mut self, visible: bool) {
            self.0.borrow_mut().visible = Some(visible);
        }
    }

    struct Harness {
        lookup: FakeLookup,
        viewer: FakeViewer,
        map: FakeMap,
        select: FakeSelect,
        controller: TimeTravelController<FakeLookup, FakeViewer, FakeMap, FakeSelect>,
    }

    fn harness() -> Harness {
        let lookup = FakeLookup::default();
        let viewer = FakeViewer::default();
        let map = FakeMap::default();
        let select = FakeSelect::default();
        let controller = TimeTravelController::new(
            lookup.clone(),
            viewer.clone(),
            map.clone(),
            select.clone(),
            HERE,
        );
        Harness {
            lookup,
            viewer,
            map,
            select,
            controller,
        }
    }

    fn seed_initial(h: &Harness) {
        // Nearest panorama is B (2021-07) with a three-entry history
        let history = vec![
            record("A", "2019-03"),
            record("B", "2021-07"),
            record("C", "2021-08"),
        ];
        h.lookup.0.borrow_mut().nearest = Some(response("B", "2021-07", history));
    }

    #[tokio::test]
    async fn test_bootstrap_configures_and_populates() {
        let mut h = harness();
        seed_initial(&h);

        h.controller.bootstrap().await.unwrap();

        let viewer = h.viewer.0.borrow();
        let config = viewer.config.as_ref().unwrap();
        assert_eq!(config.pano_id, "B");
        assert!(config.date_control);
        assert!(!config.fullscreen_control);

        let map = h.map.0.borrow();
        assert_eq!(map.config.as_ref().unwrap().zoom, 18);
        assert!(map.bound);

        let select = h.select.0.borrow();
        assert_eq!(select.replaced.len(), 1);
        let ids: Vec<&str> = select.replaced[0].iter().map(|o| o.pano_id.as_str()).collect();
        assert_eq!(ids, ["C", "B", "A"]);

        assert_eq!(h.controller.selection().last_pano_id(), Some("B"));
        assert_eq!(
            h.controller.selection().last_pano_date().unwrap().to_string(),
            "2021-07"
        );
    }

    #[tokio::test]
    async fn test_bootstrap_miss_is_terminal_message() {
        let mut h = harness();
        // No nearest panorama seeded

        h.controller.bootstrap().await.unwrap();

        let viewer = h.viewer.0.borrow();
        assert!(viewer.config.is_none());
        assert_eq!(
            viewer.messages,
            ["Could not find panorama within 25m of coordinates"]
        );
        assert!(h.select.0.borrow().replaced.is_empty());
        // Exactly one lookup, no retry
        assert_eq!(h.lookup.0.borrow().nearest_calls, 1);
    }

    #[tokio::test]
    async fn test_duplicate_change_does_no_fetch() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        // Viewer still reports B, the recorded panorama
        h.controller.handle_pano_changed().await.unwrap();

        assert_eq!(h.lookup.0.borrow().by_id_calls, 0);
        assert_eq!(h.select.0.borrow().replaced.len(), 1);
    }

    #[tokio::test]
    async fn test_accepted_change_rebuilds_list() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        let history = vec![
            record("A", "2019-03"),
            record("B", "2021-07"),
            record("C", "2021-08"),
        ];
        h.lookup
            .0
            .borrow_mut()
            .by_id
            .insert("C".to_string(), response("C", "2021-08", history));
        h.viewer.0.borrow_mut().pano = "C".to_string();

        h.controller.handle_pano_changed().await.unwrap();

        assert_eq!(h.lookup.0.borrow().by_id_calls, 1);
        assert_eq!(h.select.0.borrow().replaced.len(), 2);
        assert_eq!(h.controller.selection().last_pano_id(), Some("C"));
        assert_eq!(
            h.controller.selection().last_pano_date().unwrap().to_string(),
            "2021-08"
        );
    }

    #[tokio::test]
    async fn test_pegman_drop_schedules_single_correction() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        h.controller.handle_pegman_press();
        h.controller.handle_pegman_release();

        // Drop lands on X (2023-05); Y (2021-06) is the closest historical
        // match to the pre-drop date 2021-07
        let new_history = vec![record("X", "2023-05"), record("Y", "2021-06")];
        h.lookup
            .0
            .borrow_mut()
            .by_id
            .insert("X".to_string(), response("X", "2023-05", new_history.clone()));
        h.viewer.0.borrow_mut().pano = "X".to_string();

        h.controller.handle_pano_changed().await.unwrap();

        // Exactly one corrective set, no list rebuild for the intermediate change
        assert_eq!(h.viewer.0.borrow().set_calls, ["Y"]);
        assert_eq!(h.select.0.borrow().replaced.len(), 1);
        // Selection state untouched until the corrective set settles
        assert_eq!(h.controller.selection().last_pano_id(), Some("B"));

        // The corrective set triggers a follow-up change notification
        h.lookup
            .0
            .borrow_mut()
            .by_id
            .insert("Y".to_string(), response("Y", "2021-06", new_history));
        h.controller.handle_pano_changed().await.unwrap();

        assert_eq!(h.viewer.0.borrow().set_calls.len(), 1);
        assert_eq!(h.select.0.borrow().replaced.len(), 2);
        assert_eq!(h.controller.selection().last_pano_id(), Some("Y"));
        assert_eq!(
            h.controller.selection().last_pano_date().unwrap().to_string(),
            "2021-06"
        );
    }

    #[tokio::test]
    async fn test_drop_without_date_drift_refreshes_normally() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        h.controller.handle_pegman_press();
        h.controller.handle_pegman_release();

        // New panorama shares the pre-drop date, so no correction is due
        let history = vec![record("D", "2021-07"), record("E", "2018-01")];
        h.lookup
            .0
            .borrow_mut()
            .by_id
            .insert("D".to_string(), response("D", "2021-07", history.clone()));
        h.viewer.0.borrow_mut().pano = "D".to_string();

        h.controller.handle_pano_changed().await.unwrap();

        assert!(h.viewer.0.borrow().set_calls.is_empty());
        assert_eq!(h.controller.selection().last_pano_id(), Some("D"));

        // The consumed drop flag must not trigger a correction on the next
        // ordinary change either
        h.lookup
            .0
            .borrow_mut()
            .by_id
            .insert("E".to_string(), response("E", "2018-01", history));
        h.viewer.0.borrow_mut().pano = "E".to_string();
        h.controller.handle_pano_changed().await.unwrap();

        assert!(h.viewer.0.borrow().set_calls.is_empty());
        assert_eq!(h.controller.selection().last_pano_id(), Some("E"));
    }

    #[tokio::test]
    async fn test_release_without_press_is_ignored() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        h.controller.handle_pegman_release();
        assert!(!h.controller.selection().drop_completed);
    }

    #[tokio::test]
    async fn test_map_idle_reveals_once() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        assert_eq!(h.select.0.borrow().visible, None);

        h.controller.handle_map_idle();
        assert_eq!(h.select.0.borrow().visible, Some(true));

        h.select.0.borrow_mut().visible = None;
        h.controller.handle_map_idle();
        assert_eq!(h.select.0.borrow().visible, None);
    }

    #[tokio::test]
    async fn test_correction_signal_without_pending_target_is_noop() {
        let mut h = harness();
        seed_initial(&h);
        h.controller.bootstrap().await.unwrap();

        h.controller.handle_correction_needed().await.unwrap();
        assert!(h.viewer.0.borrow().set_calls.is_empty());
    }
}
