use geo::{Coord, MapCoords, Point, Polygon};

pub const WGS84_WKID: u32 = 4326;
pub const WEB_MERCATOR_WKID: u32 = 3857;

const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Web Mercator is undefined at the poles; inputs are clamped to its
/// conventional latitude bound.
const MAX_LATITUDE_DEG: f64 = 85.051_128_78;

/// WGS84 ↔ Web Mercator projection engine.
///
/// The engine loads asynchronously exactly once at startup, and radius
/// filtering waits on it. The Mercator math is embedded and needs no external
/// grids, but `load` stays async so callers keep the one-time readiness
/// handshake and its ordering guarantees.
#[derive(Debug, Clone)]
pub struct WebMercator {
    _ready: (),
}

impl WebMercator {
    pub async fn load() -> Result<Self, String> {
        Ok(Self { _ready: () })
    }

    /// WGS84 lon/lat degrees → planar meters.
    pub fn project_point(&self, point: Point<f64>) -> Point<f64> {
        Point::from(wgs84_to_mercator(point.0))
    }

    /// Planar meters → WGS84 lon/lat degrees.
    pub fn unproject_point(&self, point: Point<f64>) -> Point<f64> {
        Point::from(mercator_to_wgs84(point.0))
    }

    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(wgs84_to_mercator)
    }
}

fn wgs84_to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG);
    Coord {
        x: coord.x.to_radians() * EARTH_RADIUS_M,
        y: (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M,
    }
}

fn mercator_to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees(),
    }
}
