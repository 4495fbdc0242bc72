use chrono::{DateTime, Utc};
use geo::{Point, Polygon};
use medina_shared::TransportPoint;

use crate::config::{AGADIR_CENTER, AGADIR_RADIUS_KM, TANGIER_CENTER, TANGIER_RADIUS_KM};
use crate::projection::WebMercator;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Startup: projection engine not yet loaded, radius filters queue.
    AwaitingProjectionReady,
    /// No active filter criterion.
    Idle,
    /// Interactive sketch mode; sketch events drive the marker set.
    DrawingPolygon,
    /// A region or radius criterion is active on the dataset view.
    FilterApplied,
}

/// Fixed-radius presets reachable from the filter-mode control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusPreset {
    TangierOneKm,
    AgadirThreeKm,
}

impl RadiusPreset {
    pub fn center(self) -> Point<f64> {
        let (lon, lat) = match self {
            Self::TangierOneKm => TANGIER_CENTER,
            Self::AgadirThreeKm => AGADIR_CENTER,
        };
        Point::new(lon, lat)
    }

    pub fn radius_km(self) -> f64 {
        match self {
            Self::TangierOneKm => TANGIER_RADIUS_KM,
            Self::AgadirThreeKm => AGADIR_RADIUS_KM,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::TangierOneKm => "1 km around Tangier",
            Self::AgadirThreeKm => "3 km around Agadir",
        }
    }
}

/// Parsed value of the filter-mode control.
///
/// The "drawPolygon" value is kept for compatibility and runs the fixed
/// Agadir buffer; interactive drawing is a separate toggle, never a
/// dropdown value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Radius(RadiusPreset),
    Reset,
}

impl FilterMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "radius-1" | "1km" => Self::Radius(RadiusPreset::TangierOneKm),
            "draw-polygon" | "drawPolygon" | "radius-3" | "3km" => {
                Self::Radius(RadiusPreset::AgadirThreeKm)
            }
            _ => Self::Reset,
        }
    }
}

/// Typed events from the map UI surface (dropdowns, draw button, sketch
/// tool, projection loader).
#[derive(Debug, Clone)]
pub enum UiEvent {
    ProjectionReady(WebMercator),
    ProjectionFailed,
    /// Region dropdown changed; `None` clears the selection.
    RegionChanged(Option<String>),
    FilterModeChanged(FilterMode),
    /// Draw button pressed: enter sketch mode, or cancel it.
    DrawToggled,
    SketchCreated(Polygon<f64>),
    SketchUpdated(Polygon<f64>),
    SketchDeleted,
}

/// Markers rendered for the latest polygon selection.
/// Replaced wholesale on every sketch create/update; never merged.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    pub points: Vec<TransportPoint>,
    pub refreshed_at: DateTime<Utc>,
}

impl MarkerSet {
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            refreshed_at: Utc::now(),
        }
    }

    pub fn replace(points: Vec<TransportPoint>) -> Self {
        Self {
            points,
            refreshed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, RadiusPreset};

    #[test]
    fn radius_one_parses_to_tangier_preset() {
        assert_eq!(
            FilterMode::parse("radius-1"),
            FilterMode::Radius(RadiusPreset::TangierOneKm)
        );
    }

    #[test]
    fn legacy_draw_polygon_value_parses_to_agadir_preset() {
        assert_eq!(
            FilterMode::parse("draw-polygon"),
            FilterMode::Radius(RadiusPreset::AgadirThreeKm)
        );
        assert_eq!(
            FilterMode::parse("drawPolygon"),
            FilterMode::Radius(RadiusPreset::AgadirThreeKm)
        );
    }

    #[test]
    fn unknown_values_parse_to_reset() {
        assert_eq!(FilterMode::parse("reset"), FilterMode::Reset);
        assert_eq!(FilterMode::parse(""), FilterMode::Reset);
        assert_eq!(FilterMode::parse("everything"), FilterMode::Reset);
    }

    #[test]
    fn preset_radii_match_city_presets() {
        assert_eq!(RadiusPreset::TangierOneKm.radius_km(), 1.0);
        assert_eq!(RadiusPreset::AgadirThreeKm.radius_km(), 3.0);
    }
}
