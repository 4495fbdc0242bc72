use std::time::Duration;

pub const TRANSPORT_LAYER_URL: &str =
    "https://services7.arcgis.com/VdEK6E3X6dXrUHgJ/arcgis/rest/services/Transport/FeatureServer/0";

pub const OBJECT_ID_FIELD: &str = "OBJECTID";
pub const REGION_FIELD: &str = "NOM_REG";

/// Tangier city center, WGS84 lon/lat. The "radius-1" preset buffers 1 km
/// around this point.
pub const TANGIER_CENTER: (f64, f64) = (-5.8, 35.767);
pub const TANGIER_RADIUS_KM: f64 = 1.0;

/// Agadir city center. The legacy "draw-polygon" filter-mode value runs a
/// fixed 3 km buffer here; it never starts interactive drawing.
pub const AGADIR_CENTER: (f64, f64) = (-9.6, 30.4);
pub const AGADIR_RADIUS_KM: f64 = 3.0;

/// Vertex count when tessellating a geodesic circle into a ring.
pub const GEODESIC_CIRCLE_VERTICES: usize = 72;

pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;

pub fn transport_layer_url() -> String {
    std::env::var("TRANSPORT_LAYER_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| TRANSPORT_LAYER_URL.to_owned())
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}
