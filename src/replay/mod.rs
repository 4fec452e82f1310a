//! Rebuild map and view state from a stored record
//!
//! Replay never calls the generation API. The petal layout of flower-power
//! generations is not persisted, so a replayed view has no circles beyond the
//! request circle and shows the winning point only.

use crate::config::DisplaySettings;
use crate::error::{Error, Result};
use crate::history::{
    Coordinates, GenerationMetadata, GenerationRequest, GenerationResponse, HistoryRecord,
    HistoryStore, Point, ResultType, WinnerResult,
};
use crate::units::{self, MeasurementUnit};

/// Ground resolution at zoom 0 on the equator, meters per pixel
const EQUATOR_RESOLUTION: f64 = 156_543.033_92;

/// Viewport edge the request circle is fitted into, in pixels
pub const VIEWPORT_PX: f64 = 512.0;

pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 18;

/// A replayed result, shaped like a generation response without circles
pub type ResultView = GenerationResponse;

/// Where the map should point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapTarget {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Radius as shown in the active unit system
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusDisplay {
    pub unit: MeasurementUnit,
    pub value: f64,
    /// e.g. `"1.86 mi"`
    pub text: String,
}

impl RadiusDisplay {
    pub fn new(canonical: f64, unit: MeasurementUnit) -> Self {
        Self {
            unit,
            value: units::from_canonical(canonical, unit),
            text: units::display_string(canonical, unit),
        }
    }
}

/// Everything needed to show a past generation again
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayState {
    pub map: MapTarget,
    pub radius_display: RadiusDisplay,
    pub result_type: ResultType,
    /// Ready to be submitted again as-is
    pub request: GenerationRequest,
    pub view: ResultView,
}

impl ReplayState {
    /// Winner for the active result type, if the generation produced one
    pub fn active_winner(&self) -> Option<&WinnerResult> {
        self.view.winners.get(&self.result_type)
    }

    /// Point the map should highlight: the active winner or the center
    pub fn focus(&self) -> Coordinates {
        self.active_winner()
            .map(|w| w.result.coords)
            .unwrap_or(self.map.center)
    }
}

/// Receives drawing commands for a replayed view
pub trait MapRenderer {
    fn clear(&mut self);
    fn set_view(&mut self, center: Coordinates, zoom: u8);
    /// `radius` is in meters
    fn draw_circle(&mut self, center: Coordinates, radius: f64);
    fn draw_marker(&mut self, result_type: ResultType, point: &Point);
}

/// Zoom level at which a circle of `radius` meters fits the viewport.
///
/// Uses Web-Mercator ground resolution at `lat`, floored and clamped to
/// [`MIN_ZOOM`]..=[`MAX_ZOOM`].
pub fn zoom_for_radius(radius: f64, lat: f64) -> u8 {
    let diameter = 2.0 * radius;
    let zoom = (EQUATOR_RESOLUTION * lat.to_radians().cos() * VIEWPORT_PX / diameter).log2();
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.floor().clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

pub struct ReplayEngine;

impl ReplayEngine {
    /// Replay the record stored under `id`
    pub fn replay(
        store: &mut HistoryStore,
        id: &str,
        settings: &DisplaySettings,
    ) -> Result<ReplayState> {
        let record = store
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("history record {}", id)))?;
        Ok(Self::replay_record(record, settings))
    }

    pub fn replay_record(record: &HistoryRecord, settings: &DisplaySettings) -> ReplayState {
        let request = record.request().clone();
        let center = request.center();

        let view = ResultView {
            id: record.id().to_string(),
            request: request.clone(),
            circles: Vec::new(),
            winners: record.winners().clone(),
            metadata: GenerationMetadata {
                timestamp: record.timestamp().to_rfc3339(),
            },
        };

        tracing::debug!(id = %record.id(), "Replaying history record");
        ReplayState {
            map: MapTarget {
                center,
                zoom: zoom_for_radius(request.radius, request.lat),
            },
            radius_display: RadiusDisplay::new(request.radius, settings.units.radius_unit()),
            result_type: request.result_type.unwrap_or_default(),
            request,
            view,
        }
    }

    /// Draw a replayed state: the request circle and the active winner
    pub fn render(state: &ReplayState, renderer: &mut dyn MapRenderer) {
        renderer.clear();
        renderer.set_view(state.map.center, state.map.zoom);
        renderer.draw_circle(state.map.center, state.request.radius);
        if let Some(winner) = state.active_winner() {
            renderer.draw_marker(state.result_type, &winner.result);
        }
    }
}
