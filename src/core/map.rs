use crate::config::MapConfig;
use crate::core::reading::Reading;
use crate::core::score::Band;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};

pub const MARKER_RADIUS: u32 = 10;
pub const MARKER_FILL_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapPoint {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub username: String,
    pub ph: f64,
    pub turbidity: f64,
    pub wqi: u8,
    pub band: Band,
    pub color: &'static str,
}

impl MapPoint {
    pub fn from_reading(reading: &Reading) -> Option<Self> {
        let (latitude, longitude) = reading.coordinates()?;
        let band = reading.band();
        Some(Self {
            id: reading.id,
            latitude,
            longitude,
            location: reading.location.clone(),
            username: reading.username.clone(),
            ph: reading.ph,
            turbidity: reading.turbidity,
            wqi: reading.wqi(),
            band,
            color: band.hex_color(),
        })
    }
}

/// Readings that can be placed on the map; rows without usable coordinates are skipped.
pub fn points(readings: &[Reading]) -> Vec<MapPoint> {
    readings.iter().filter_map(MapPoint::from_reading).collect()
}

pub fn to_geojson(points: &[MapPoint]) -> Value {
    let features: Vec<Value> = points
        .iter()
        .map(|point| {
            json!({
                "type": "Feature",
                "id": point.id,
                "geometry": {
                    "type": "Point",
                    "coordinates": [point.longitude, point.latitude],
                },
                "properties": {
                    "location": point.location,
                    "username": point.username,
                    "ph": point.ph,
                    "turbidity": point.turbidity,
                    "wqi": point.wqi,
                    "band": point.band.label(),
                    "marker-color": point.color,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Standalone Leaflet page drawing one colored circle marker per point.
pub fn to_html(points: &[MapPoint], cfg: &MapConfig) -> Result<String> {
    let data = serde_json::to_string(points).context("failed to serialize map points")?;
    let tile_url = serde_json::to_string(&cfg.tile_url).context("failed to serialize tile url")?;
    let attribution =
        serde_json::to_string(&cfg.attribution).context("failed to serialize attribution")?;

    Ok(HTML_TEMPLATE
        .replace("{{CENTER_LAT}}", &cfg.center_latitude.to_string())
        .replace("{{CENTER_LNG}}", &cfg.center_longitude.to_string())
        .replace("{{ZOOM}}", &cfg.zoom.to_string())
        .replace("{{RADIUS}}", &MARKER_RADIUS.to_string())
        .replace("{{FILL_OPACITY}}", &MARKER_FILL_OPACITY.to_string())
        .replace("{{TILE_URL}}", &script_safe(&tile_url))
        .replace("{{ATTRIBUTION}}", &script_safe(&attribution))
        .replace("{{POINTS}}", &script_safe(&data)))
}

// JSON is valid JS, but a literal `</script>` inside a string would end the element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Nephranet water quality map</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { width: 100%; height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
const points = {{POINTS}};
const map = L.map("map").setView([{{CENTER_LAT}}, {{CENTER_LNG}}], {{ZOOM}});
L.tileLayer({{TILE_URL}}, { attribution: {{ATTRIBUTION}} }).addTo(map);
for (const p of points) {
  const popup = document.createElement("div");
  const title = document.createElement("h3");
  title.textContent = p.location;
  popup.appendChild(title);
  for (const line of ["pH: " + p.ph, "Turbidity: " + p.turbidity, "WQI: " + p.wqi, "Uploaded by: " + p.username]) {
    const row = document.createElement("p");
    row.textContent = line;
    popup.appendChild(row);
  }
  L.circleMarker([p.latitude, p.longitude], {
    color: p.color,
    fillColor: p.color,
    fillOpacity: {{FILL_OPACITY}},
    radius: {{RADIUS}},
  }).bindPopup(popup).addTo(map);
}
</script>
</body>
</html>
"#;
