use std::collections::BTreeSet;

use geo::Point;
use serde::{Deserialize, Serialize};

/// One transport station from the hosted point layer.
///
/// Owned and persisted by the feature service; the controller only ever reads
/// snapshots of these, so the struct is plain data with no service handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportPoint {
    pub object_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fclass: String,
    /// Administrative region name (`NOM_REG` on the service).
    #[serde(default)]
    pub region: String,
    /// WGS84 position. `None` when the query skipped geometry.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point<f64>>,
}

impl TransportPoint {
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        self.position.map(|p| (p.x(), p.y()))
    }
}

/// Distinct region names across a scan, sorted for a stable dropdown.
/// Blank region attributes are skipped.
pub fn distinct_regions(points: &[TransportPoint]) -> Vec<String> {
    let unique: BTreeSet<&str> = points
        .iter()
        .map(|p| p.region.as_str())
        .filter(|r| !r.is_empty())
        .collect();
    unique.into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::{TransportPoint, distinct_regions};

    fn station(id: u64, region: &str) -> TransportPoint {
        TransportPoint {
            object_id: id,
            name: format!("station-{id}"),
            fclass: "bus_stop".into(),
            region: region.into(),
            position: None,
        }
    }

    #[test]
    fn distinct_regions_deduplicates_and_sorts() {
        let points = vec![
            station(1, "Tanger-Tetouan-Al Hoceima"),
            station(2, "Souss-Massa"),
            station(3, "Tanger-Tetouan-Al Hoceima"),
            station(4, "Rabat-Sale-Kenitra"),
        ];
        assert_eq!(
            distinct_regions(&points),
            vec![
                "Rabat-Sale-Kenitra",
                "Souss-Massa",
                "Tanger-Tetouan-Al Hoceima",
            ]
        );
    }

    #[test]
    fn distinct_regions_skips_blank_names() {
        let points = vec![station(1, ""), station(2, "Souss-Massa")];
        assert_eq!(distinct_regions(&points), vec!["Souss-Massa"]);
    }

    #[test]
    fn distinct_regions_of_empty_scan_is_empty() {
        assert!(distinct_regions(&[]).is_empty());
    }
}
