use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, Coord, Destination, Haversine, LineString, Point, Polygon};

/// Geodesic circular buffer: a ring of points all `radius_m` meters from
/// `center` along great circles, tessellated into `vertices` segments.
pub fn geodesic_circle(center: Point<f64>, radius_m: f64, vertices: usize) -> Polygon<f64> {
    let vertices = vertices.max(3);
    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(vertices + 1);
    for i in 0..vertices {
        let bearing = 360.0 * i as f64 / vertices as f64;
        ring.push(Haversine.destination(center, bearing, radius_m).0);
    }
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Normalize a freehand sketch before it is used as a query area.
///
/// Zero-distance-buffer equivalent: closes the ring, drops repeated
/// vertices, rejects rings with fewer than three distinct vertices or no
/// area, and fixes winding order. Returns `None` for sketches too degenerate
/// to query with.
pub fn normalize_sketch(sketch: &Polygon<f64>) -> Option<Polygon<f64>> {
    let mut coords: Vec<Coord<f64>> = sketch.exterior().coords().copied().collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords.dedup();
    if coords.len() < 3 {
        return None;
    }
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    let closed = Polygon::new(LineString::new(coords), Vec::new());
    if closed.unsigned_area() == 0.0 {
        return None;
    }
    Some(closed.orient(Direction::Default))
}

#[cfg(test)]
mod tests {
    use geo::{Area, Contains, Coord, Distance, Haversine, LineString, Point, Polygon};

    use super::{geodesic_circle, normalize_sketch};

    const TANGIER: (f64, f64) = (-5.8, 35.767);

    #[test]
    fn circle_vertices_sit_at_the_requested_radius() {
        let center = Point::new(TANGIER.0, TANGIER.1);
        let circle = geodesic_circle(center, 1_000.0, 72);
        for coord in circle.exterior().coords() {
            let d = Haversine.distance(center, Point::from(*coord));
            assert!((d - 1_000.0).abs() < 1.0, "vertex at {d} m from center");
        }
    }

    #[test]
    fn circle_contains_its_center_and_nearby_points() {
        let center = Point::new(TANGIER.0, TANGIER.1);
        let circle = geodesic_circle(center, 1_000.0, 72);
        assert!(circle.contains(&center));
        // ~300 m east of center
        assert!(circle.contains(&Point::new(TANGIER.0 + 0.0033, TANGIER.1)));
        // ~2 km north of center
        assert!(!circle.contains(&Point::new(TANGIER.0, TANGIER.1 + 0.018)));
    }

    #[test]
    fn smaller_circle_nests_inside_larger_one() {
        let center = Point::new(TANGIER.0, TANGIER.1);
        let inner = geodesic_circle(center, 1_000.0, 72);
        let outer = geodesic_circle(center, 3_000.0, 72);
        for coord in inner.exterior().coords() {
            assert!(outer.contains(&Point::from(*coord)));
        }
    }

    #[test]
    fn normalize_closes_an_open_ring() {
        let open = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 4.0, y: 0.0 },
                Coord { x: 4.0, y: 4.0 },
                Coord { x: 0.0, y: 4.0 },
            ]),
            Vec::new(),
        );
        let normalized = normalize_sketch(&open).expect("valid square");
        let ring = normalized.exterior();
        assert_eq!(ring.coords().next(), ring.coords().last());
        assert!((normalized.unsigned_area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_drops_repeated_vertices() {
        let stuttering = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 2.0, y: 0.0 },
                Coord { x: 2.0, y: 0.0 },
                Coord { x: 1.0, y: 2.0 },
            ]),
            Vec::new(),
        );
        let normalized = normalize_sketch(&stuttering).expect("valid triangle");
        // closing vertex plus the three distinct ones
        assert_eq!(normalized.exterior().coords().count(), 4);
    }

    #[test]
    fn normalize_rejects_degenerate_sketches() {
        let two_points = Polygon::new(
            LineString::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }]),
            Vec::new(),
        );
        assert!(normalize_sketch(&two_points).is_none());

        let collinear = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 2.0, y: 2.0 },
            ]),
            Vec::new(),
        );
        assert!(normalize_sketch(&collinear).is_none());
    }

    #[test]
    fn normalize_is_idempotent() {
        let square = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 4.0, y: 0.0 },
                Coord { x: 4.0, y: 4.0 },
                Coord { x: 0.0, y: 4.0 },
            ]),
            Vec::new(),
        );
        let once = normalize_sketch(&square).expect("valid square");
        let twice = normalize_sketch(&once).expect("still valid");
        assert_eq!(once, twice);
    }
}
