use geo::{Contains, Point, Polygon};
use medina_shared::{FilterPredicate, TransportPoint, distinct_regions};
use tracing::{debug, info, warn};

use crate::config::{GEODESIC_CIRCLE_VERTICES, OBJECT_ID_FIELD, REGION_FIELD};
use crate::dataset::PointDataset;
use crate::geometry;
use crate::projection::WebMercator;
use crate::state::{FilterMode, MarkerSet, Phase, RadiusPreset, UiEvent};

enum ProjectionStatus {
    Loading,
    Ready(WebMercator),
    Failed,
}

/// Spatial filter controller for the transport point layer.
///
/// Holds the single active filter criterion (attribute, identifier set, or
/// drawn-polygon marker selection) and recomputes it from scratch on every
/// trigger. All collaborators are injected; the dataset is only ever read.
pub struct SpatialFilter<D: PointDataset> {
    dataset: D,
    projection: ProjectionStatus,
    phase: Phase,
    active: FilterPredicate,
    visible: Vec<TransportPoint>,
    markers: MarkerSet,
    regions: Vec<String>,
    pending_radius: Option<RadiusPreset>,
    /// Monotonic trigger token. A query result is applied only if no newer
    /// trigger was issued while it was in flight.
    issued_token: u64,
}

impl<D: PointDataset> SpatialFilter<D> {
    pub fn new(dataset: D) -> Self {
        Self {
            dataset,
            projection: ProjectionStatus::Loading,
            phase: Phase::AwaitingProjectionReady,
            active: FilterPredicate::None,
            visible: Vec::new(),
            markers: MarkerSet::empty(),
            regions: Vec::new(),
            pending_radius: None,
            issued_token: 0,
        }
    }

    /// One-time startup scan: populates the region dropdown and the
    /// unfiltered baseline. A failed scan leaves the dropdown empty; region
    /// filtering is then simply unavailable.
    pub async fn initialize(&mut self) {
        match self.dataset.fetch_all().await {
            Ok(points) => {
                self.regions = distinct_regions(&points);
                info!(
                    points = points.len(),
                    regions = self.regions.len(),
                    "initial dataset scan complete"
                );
                self.visible = points;
            }
            Err(e) => {
                warn!(error = %e, "initial dataset scan failed; region dropdown stays empty");
            }
        }
    }

    pub async fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::ProjectionReady(engine) => {
                if !matches!(self.projection, ProjectionStatus::Loading) {
                    debug!("duplicate projection readiness signal ignored");
                    return;
                }
                self.projection = ProjectionStatus::Ready(engine);
                info!("projection engine ready");
                if self.phase == Phase::AwaitingProjectionReady {
                    self.phase = Phase::Idle;
                }
                if let Some(preset) = self.pending_radius.take() {
                    info!(preset = preset.label(), "applying queued radius filter");
                    self.filter_by_radius(preset.center(), preset.radius_km())
                        .await;
                }
            }
            UiEvent::ProjectionFailed => {
                self.projection = ProjectionStatus::Failed;
                self.pending_radius = None;
                if self.phase == Phase::AwaitingProjectionReady {
                    self.phase = Phase::Idle;
                }
                warn!("projection engine unavailable; radius filtering disabled for this session");
            }
            UiEvent::RegionChanged(region) => self.filter_by_region(region.as_deref()).await,
            UiEvent::FilterModeChanged(FilterMode::Radius(preset)) => match &self.projection {
                ProjectionStatus::Loading => {
                    info!(
                        preset = preset.label(),
                        "projection not ready; queueing radius filter"
                    );
                    self.pending_radius = Some(preset);
                }
                ProjectionStatus::Failed => {
                    warn!(
                        preset = preset.label(),
                        "radius filtering disabled; ignoring request"
                    );
                }
                ProjectionStatus::Ready(_) => {
                    self.filter_by_radius(preset.center(), preset.radius_km())
                        .await;
                }
            },
            UiEvent::FilterModeChanged(FilterMode::Reset) => self.reset().await,
            UiEvent::DrawToggled => self.toggle_drawing().await,
            UiEvent::SketchCreated(polygon) | UiEvent::SketchUpdated(polygon) => {
                if self.phase == Phase::DrawingPolygon {
                    self.filter_by_polygon(&polygon).await;
                } else {
                    debug!("sketch event outside drawing mode ignored");
                }
            }
            UiEvent::SketchDeleted => {
                self.next_token();
                self.markers = MarkerSet::empty();
            }
        }
    }

    /// Attribute filter on the region name. `None` or an empty name clears
    /// filtering entirely; an unmatched name yields an empty, valid result.
    pub async fn filter_by_region(&mut self, region: Option<&str>) {
        let predicate = match region {
            None => FilterPredicate::None,
            Some("") => FilterPredicate::None,
            Some(name) => {
                if !self.regions.is_empty() && !self.regions.iter().any(|known| known == name) {
                    debug!(region = name, "region not seen in startup scan");
                }
                FilterPredicate::attribute_equals(REGION_FIELD, name)
            }
        };
        self.apply_predicate(predicate).await;
    }

    /// Geodesic radius filter: buffer the center, reproject buffer and points
    /// into the planar reference, keep contained identifiers, and publish
    /// them as an identifier-set predicate. Zero matches still publish a
    /// predicate that shows zero features.
    pub async fn filter_by_radius(&mut self, center: Point<f64>, radius_km: f64) {
        let mercator = match &self.projection {
            ProjectionStatus::Ready(engine) => engine.clone(),
            _ => {
                warn!("projection engine not ready; radius filter unavailable");
                return;
            }
        };
        let token = self.next_token();
        let circle =
            geometry::geodesic_circle(center, radius_km * 1_000.0, GEODESIC_CIRCLE_VERTICES);
        let planar_circle = mercator.project_polygon(&circle);

        let points = match self.dataset.fetch_all().await {
            Ok(points) => points,
            Err(e) => {
                warn!(error = %e, "radius filter scan failed; keeping previous results");
                return;
            }
        };
        if !self.is_current(token) {
            debug!("discarding stale radius scan result");
            return;
        }

        let ids: Vec<u64> = points
            .iter()
            .filter(|point| {
                point
                    .position
                    .is_some_and(|pos| planar_circle.contains(&mercator.project_point(pos)))
            })
            .map(|point| point.object_id)
            .collect();
        if ids.is_empty() {
            info!(radius_km, "no transport points within radius");
        } else {
            info!(radius_km, matched = ids.len(), "transport points within radius");
        }
        self.apply_predicate(FilterPredicate::id_in(OBJECT_ID_FIELD, ids))
            .await;
    }

    /// Containment selection for a freehand sketch. The marker set is
    /// replaced wholesale on every invocation; identical sketches therefore
    /// yield identical marker sets.
    pub async fn filter_by_polygon(&mut self, sketch: &Polygon<f64>) {
        let Some(area) = geometry::normalize_sketch(sketch) else {
            debug!("ignoring degenerate sketch");
            return;
        };
        let token = self.next_token();
        match self.dataset.query_contained_in(&area).await {
            Ok(points) => {
                if !self.is_current(token) {
                    debug!("discarding stale sketch selection");
                    return;
                }
                info!(matched = points.len(), "sketch selection updated");
                self.markers = MarkerSet::replace(points);
            }
            Err(e) => {
                warn!(error = %e, "sketch selection query failed; keeping previous markers");
            }
        }
    }

    /// Clear any active criterion and refresh, so hidden features reappear.
    pub async fn reset(&mut self) {
        self.apply_predicate(FilterPredicate::None).await;
    }

    async fn toggle_drawing(&mut self) {
        self.next_token();
        if self.phase == Phase::DrawingPolygon {
            self.markers = MarkerSet::empty();
            self.phase = self.settled_phase();
            info!("polygon drawing cancelled");
        } else {
            // One criterion at a time: entering sketch mode drops any
            // attribute or radius filter before markers take over.
            if !self.active.is_none() {
                self.reset().await;
            }
            self.markers = MarkerSet::empty();
            self.phase = Phase::DrawingPolygon;
            info!("polygon drawing started");
        }
    }

    async fn apply_predicate(&mut self, predicate: FilterPredicate) {
        let token = self.next_token();
        match self.dataset.query_where(&predicate).await {
            Ok(points) => {
                if !self.is_current(token) {
                    debug!("discarding stale filter result");
                    return;
                }
                info!(
                    where_clause = %predicate.to_where_clause(),
                    visible = points.len(),
                    "filter expression applied"
                );
                self.active = predicate;
                self.visible = points;
                self.markers = MarkerSet::empty();
                self.phase = self.settled_phase();
            }
            Err(e) => {
                warn!(error = %e, "filter query failed; keeping previous results");
            }
        }
    }

    fn settled_phase(&self) -> Phase {
        if self.active.is_none() {
            if matches!(self.projection, ProjectionStatus::Loading) {
                Phase::AwaitingProjectionReady
            } else {
                Phase::Idle
            }
        } else {
            Phase::FilterApplied
        }
    }

    fn next_token(&mut self) -> u64 {
        self.issued_token += 1;
        self.issued_token
    }

    fn is_current(&self, token: u64) -> bool {
        token == self.issued_token
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn active_predicate(&self) -> &FilterPredicate {
        &self.active
    }

    pub fn visible(&self) -> &[TransportPoint] {
        &self.visible
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn radius_available(&self) -> bool {
        matches!(self.projection, ProjectionStatus::Ready(_))
    }
}
