use crate::error::{Result, TimeTravelError};
use crate::types::{CaptureDate, PanoramaRecord};
use log::warn;

/// A single selectable entry in the date-selection list.
#[derive(Debug, Clone, PartialEq)]
pub struct DateOption {
    /// Option value: the panorama identifier to switch to
    pub pano_id: String,
    /// User-visible label, e.g. `"July 2021"`
    pub label: String,
    /// Capture date backing this entry
    pub date: CaptureDate,
    /// Whether this entry is the default selection
    pub selected: bool,
}

/// Result of building the time-travel list for one panorama history.
#[derive(Debug, Clone)]
pub struct TimeTravelOptions {
    /// Selectable entries, most recent first
    pub options: Vec<DateOption>,
    /// Identifier of the entry closest in time to the target date
    pub closest_pano_id: String,
    /// Capture date of that entry
    pub closest_date: CaptureDate,
}

/// Build the date-selection list for a panorama history, with the entry
/// closest in time to `target` marked as selected.
///
/// Entries without a capture date cannot be matched against the target and
/// are excluded from the list. The remaining entries are ordered most recent
/// first regardless of input order. Among entries equidistant from the
/// target, the more recent date wins: the traversal visits newest first and
/// a strict `<` comparison keeps the first minimum it sees.
///
/// Returns [`TimeTravelError::EmptyHistory`] when no entry carries a date.
pub fn time_travel_options(
    history: &[PanoramaRecord],
    target: CaptureDate,
) -> Result<TimeTravelOptions> {
    let mut dated: Vec<(&PanoramaRecord, CaptureDate)> = Vec::with_capacity(history.len());
    for record in history {
        match record.capture_date {
            Some(date) => dated.push((record, date)),
            None => warn!("No capture date on panorama {}, skipping", record.pano_id),
        }
    }
    if dated.is_empty() {
        return Err(TimeTravelError::EmptyHistory);
    }

    dated.sort_by(|a, b| b.1.cmp(&a.1));

    let mut min_diff = u64::MAX;
    let mut closest = 0;
    let mut options = Vec::with_capacity(dated.len());

    for (idx, (record, date)) in dated.iter().enumerate() {
        let diff = date.months_between(target);
        if diff < min_diff {
            min_diff = diff;
            closest = idx;
        }
        options.push(DateOption {
            pano_id: record.pano_id.clone(),
            label: date.label(),
            date: *date,
            selected: false,
        });
    }

    options[closest].selected = true;

    Ok(TimeTravelOptions {
        closest_pano_id: options[closest].pano_id.clone(),
        closest_date: options[closest].date,
        options,
    })
}
