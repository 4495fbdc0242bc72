mod arcgis;
mod config;
mod controller;
mod dataset;
mod geometry;
mod projection;
mod state;

use geo::{Coord, LineString, Polygon};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::arcgis::ArcGisFeatureService;
use crate::controller::SpatialFilter;
use crate::dataset::PointDataset;
use crate::projection::WebMercator;
use crate::state::{FilterMode, UiEvent};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let layer_url = config::transport_layer_url();
    info!(%layer_url, "Medina transport filter starting");

    let dataset = ArcGisFeatureService::new(build_http_client(), layer_url);
    let mut filter = SpatialFilter::new(dataset);
    filter.initialize().await;

    match WebMercator::load().await {
        Ok(engine) => {
            info!(
                planar_wkid = projection::WEB_MERCATOR_WKID,
                "projection engine loaded"
            );
            filter.handle(UiEvent::ProjectionReady(engine)).await;
        }
        Err(e) => {
            error!(error = %e, "projection engine failed to load");
            filter.handle(UiEvent::ProjectionFailed).await;
        }
    }

    run_console(&mut filter).await;
    info!("controller shut down");
}

fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("medina-map/0.1")
        .timeout(config::upstream_http_timeout())
        .connect_timeout(config::upstream_connect_timeout())
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to build configured HTTP client; using defaults");
            reqwest::Client::new()
        })
}

/// Headless stand-in for the map UI: each stdin line maps to one widget
/// event.
async fn run_console<D: PointDataset>(filter: &mut SpatialFilter<D>) {
    println!("commands: region <name>|-, mode <radius-1|draw-polygon|reset>, draw,");
    println!("          sketch <lon,lat> x3+, adjust <lon,lat> x3+, erase, regions, status, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read command");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Regions) => {
                for region in filter.regions() {
                    println!("  {region}");
                }
            }
            Ok(Command::Status) => print_status(filter),
            Ok(Command::Event(event)) => {
                filter.handle(event).await;
                print_status(filter);
            }
            Err(e) => println!("error: {e}"),
        }
    }
}

fn print_status<D: PointDataset>(filter: &SpatialFilter<D>) {
    println!(
        "phase: {:?} | filter: {} | visible: {} | markers: {} | radius filters: {}",
        filter.phase(),
        filter.active_predicate().to_where_clause(),
        filter.visible().len(),
        filter.markers().points.len(),
        if filter.radius_available() {
            "available"
        } else {
            "unavailable"
        },
    );
}

enum Command {
    Event(UiEvent),
    Regions,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "quit" | "exit" => Ok(Command::Quit),
        "regions" => Ok(Command::Regions),
        "status" => Ok(Command::Status),
        "region" => {
            let selection = match rest {
                "" | "-" => None,
                name => Some(name.to_owned()),
            };
            Ok(Command::Event(UiEvent::RegionChanged(selection)))
        }
        "mode" => Ok(Command::Event(UiEvent::FilterModeChanged(
            FilterMode::parse(rest),
        ))),
        "draw" => Ok(Command::Event(UiEvent::DrawToggled)),
        "sketch" => Ok(Command::Event(UiEvent::SketchCreated(parse_ring(rest)?))),
        "adjust" => Ok(Command::Event(UiEvent::SketchUpdated(parse_ring(rest)?))),
        "erase" => Ok(Command::Event(UiEvent::SketchDeleted)),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_ring(rest: &str) -> Result<Polygon<f64>, String> {
    let mut coords = Vec::new();
    for pair in rest.split_whitespace() {
        let (lon, lat) = pair
            .split_once(',')
            .ok_or_else(|| format!("expected lon,lat but got: {pair}"))?;
        coords.push(Coord {
            x: lon
                .parse::<f64>()
                .map_err(|_| format!("bad longitude: {lon}"))?,
            y: lat
                .parse::<f64>()
                .map_err(|_| format!("bad latitude: {lat}"))?,
        });
    }
    if coords.len() < 3 {
        return Err("a sketch needs at least three lon,lat vertices".to_owned());
    }
    Ok(Polygon::new(LineString::new(coords), Vec::new()))
}
