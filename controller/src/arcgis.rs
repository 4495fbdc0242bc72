use geo::{Point, Polygon};
use medina_shared::{FilterPredicate, TransportPoint};
use serde::Deserialize;

use crate::dataset::PointDataset;
use crate::projection::WGS84_WKID;

/// Client for one hosted feature-service layer (`.../FeatureServer/<id>`).
#[derive(Clone)]
pub struct ArcGisFeatureService {
    client: reqwest::Client,
    layer_url: String,
}

impl ArcGisFeatureService {
    pub fn new(client: reqwest::Client, layer_url: String) -> Self {
        Self { client, layer_url }
    }

    async fn run_query(&self, params: Vec<(&'static str, String)>) -> Result<Vec<TransportPoint>, String> {
        let resp = self
            .client
            .get(format!("{}/query", self.layer_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;

        if !status.is_success() {
            return Err(format!(
                "upstream status {status}; body preview: {}",
                body_preview(&bytes)
            ));
        }

        parse_query_payload(&bytes)
            .map_err(|e| format!("{e}; body preview: {}", body_preview(&bytes)))
    }
}

impl PointDataset for ArcGisFeatureService {
    async fn fetch_all(&self) -> Result<Vec<TransportPoint>, String> {
        self.run_query(attribute_query_params(&FilterPredicate::None))
            .await
    }

    async fn query_where(
        &self,
        predicate: &FilterPredicate,
    ) -> Result<Vec<TransportPoint>, String> {
        self.run_query(attribute_query_params(predicate)).await
    }

    async fn query_contained_in(
        &self,
        area: &Polygon<f64>,
    ) -> Result<Vec<TransportPoint>, String> {
        self.run_query(spatial_query_params(area)).await
    }
}

fn base_params(where_clause: String) -> Vec<(&'static str, String)> {
    vec![
        ("f", "json".to_owned()),
        ("where", where_clause),
        ("outFields", "*".to_owned()),
        ("returnGeometry", "true".to_owned()),
        ("outSR", WGS84_WKID.to_string()),
    ]
}

fn attribute_query_params(predicate: &FilterPredicate) -> Vec<(&'static str, String)> {
    base_params(predicate.to_where_clause())
}

/// Parameters for a server-side containment query: features lying inside the
/// sketch area, so no client-side containment loop is needed.
fn spatial_query_params(area: &Polygon<f64>) -> Vec<(&'static str, String)> {
    let mut params = base_params("1=1".to_owned());
    params.push(("geometry", polygon_esri_json(area).to_string()));
    params.push(("geometryType", "esriGeometryPolygon".to_owned()));
    params.push(("spatialRel", "esriSpatialRelContains".to_owned()));
    params.push(("inSR", WGS84_WKID.to_string()));
    params
}

/// Esri JSON polygon: exterior ring as `[lon, lat]` pairs.
fn polygon_esri_json(area: &Polygon<f64>) -> serde_json::Value {
    let ring: Vec<[f64; 2]> = area.exterior().coords().map(|c| [c.x, c.y]).collect();
    serde_json::json!({
        "rings": [ring],
        "spatialReference": { "wkid": WGS84_WKID },
    })
}

fn body_preview(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).chars().take(200).collect()
}

#[derive(Deserialize)]
struct RawQueryResponse {
    #[serde(default)]
    features: Vec<RawFeature>,
    /// The service reports its own failures inside a 200 response.
    error: Option<RawServiceError>,
}

#[derive(Deserialize)]
struct RawServiceError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct RawFeature {
    attributes: RawAttributes,
    geometry: Option<RawPoint>,
}

#[derive(Deserialize)]
struct RawAttributes {
    #[serde(rename = "OBJECTID")]
    object_id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fclass: Option<String>,
    #[serde(rename = "NOM_REG")]
    #[serde(default)]
    region: Option<String>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

fn parse_query_payload(bytes: &[u8]) -> Result<Vec<TransportPoint>, String> {
    let payload: RawQueryResponse =
        serde_json::from_slice(bytes).map_err(|e| format!("failed to decode query payload: {e}"))?;

    if let Some(error) = payload.error {
        return Err(format!("service error {}: {}", error.code, error.message));
    }

    Ok(payload
        .features
        .into_iter()
        .map(|feature| TransportPoint {
            object_id: feature.attributes.object_id,
            name: feature.attributes.name.unwrap_or_default(),
            fclass: feature.attributes.fclass.unwrap_or_default(),
            region: feature.attributes.region.unwrap_or_default(),
            position: feature.geometry.map(|g| Point::new(g.x, g.y)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use geo::{Coord, LineString, Polygon};
    use medina_shared::FilterPredicate;

    use super::{attribute_query_params, parse_query_payload, polygon_esri_json, spatial_query_params};

    #[test]
    fn parses_features_with_and_without_geometry() {
        let payload = br#"{
            "features": [
                {
                    "attributes": {
                        "OBJECTID": 12,
                        "name": "Gare Routiere",
                        "fclass": "bus_station",
                        "NOM_REG": "Tanger-Tetouan-Al Hoceima"
                    },
                    "geometry": { "x": -5.81, "y": 35.76 }
                },
                {
                    "attributes": { "OBJECTID": 13 }
                }
            ]
        }"#;

        let points = parse_query_payload(payload).expect("valid payload");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].object_id, 12);
        assert_eq!(points[0].region, "Tanger-Tetouan-Al Hoceima");
        assert_eq!(points[0].lon_lat(), Some((-5.81, 35.76)));
        assert_eq!(points[1].object_id, 13);
        assert_eq!(points[1].name, "");
        assert!(points[1].position.is_none());
    }

    #[test]
    fn empty_feature_list_parses_to_no_points() {
        let points = parse_query_payload(br#"{"features": []}"#).expect("valid payload");
        assert!(points.is_empty());
    }

    #[test]
    fn service_error_payload_is_surfaced() {
        let payload = br#"{"error": {"code": 400, "message": "Invalid where clause"}}"#;
        let err = parse_query_payload(payload).expect_err("error payload");
        assert!(err.contains("400"));
        assert!(err.contains("Invalid where clause"));
    }

    #[test]
    fn truncated_payload_reports_decode_failure() {
        let err = parse_query_payload(br#"{"features": ["#).expect_err("bad json");
        assert!(err.contains("failed to decode query payload"));
    }

    #[test]
    fn attribute_params_carry_rendered_where_clause() {
        let params = attribute_query_params(&FilterPredicate::attribute_equals(
            "NOM_REG",
            "Souss-Massa",
        ));
        let find = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(find("where"), Some("NOM_REG = 'Souss-Massa'"));
        assert_eq!(find("f"), Some("json"));
        assert_eq!(find("returnGeometry"), Some("true"));
        assert_eq!(find("outSR"), Some("4326"));
    }

    #[test]
    fn spatial_params_request_containment_relationship() {
        let square = Polygon::new(
            LineString::new(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            Vec::new(),
        );
        let params = spatial_query_params(&square);
        let find = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(find("geometryType"), Some("esriGeometryPolygon"));
        assert_eq!(find("spatialRel"), Some("esriSpatialRelContains"));
        assert_eq!(find("inSR"), Some("4326"));
        let geometry = find("geometry").expect("geometry param");
        assert!(geometry.contains("\"rings\""));
    }

    #[test]
    fn esri_json_ring_preserves_vertex_order() {
        let triangle = Polygon::new(
            LineString::new(vec![
                Coord { x: -5.8, y: 35.7 },
                Coord { x: -5.7, y: 35.7 },
                Coord { x: -5.75, y: 35.8 },
                Coord { x: -5.8, y: 35.7 },
            ]),
            Vec::new(),
        );
        let json = polygon_esri_json(&triangle);
        let rings = json["rings"].as_array().expect("rings array");
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].as_array().expect("ring").len(), 4);
        assert_eq!(rings[0][0][0], -5.8);
        assert_eq!(json["spatialReference"]["wkid"], 4326);
    }
}
