use geo::Polygon;
use medina_shared::{FilterPredicate, TransportPoint};

/// Read-only queryable point dataset.
///
/// The hosted feature service implements this over HTTP; tests drive the
/// controller with an in-memory implementation instead. Failures carry a
/// human-readable context string; the controller logs them and leaves its
/// state untouched.
#[allow(async_fn_in_trait)]
pub trait PointDataset {
    /// Full scan with geometry, ignoring any active filter.
    async fn fetch_all(&self) -> Result<Vec<TransportPoint>, String>;

    /// Points matching an attribute/identifier predicate.
    async fn query_where(
        &self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<TransportPoint>, String>;

    /// Points spatially contained in `area` (WGS84 ring), evaluated
    /// service-side.
    async fn query_contained_in(
        &self,
        area: &Polygon<f64>,
    ) -> Result<Vec<TransportPoint>, String>;
}
