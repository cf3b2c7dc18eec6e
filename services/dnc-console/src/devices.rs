//! Device map markers as GeoJSON

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

const ACTIVE_COLOR: &str = "#2aad27";
const INACTIVE_COLOR: &str = "#cb2b3e";
const FALLBACK_CENTER: (f64, f64) = (51.505, -0.09);

/// A deployed device shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub dev_eui: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub active: bool,
}

/// Map centre as `(latitude, longitude)`: the first device, or a fixed point
pub fn map_center(devices: &[DeviceConfig]) -> (f64, f64) {
    devices
        .first()
        .map(|d| (d.latitude, d.longitude))
        .unwrap_or(FALLBACK_CENTER)
}

/// Render devices as a GeoJSON `FeatureCollection`
///
/// GeoJSON orders coordinates longitude first.
pub fn to_geojson(devices: &[DeviceConfig]) -> JsonValue {
    let features: Vec<JsonValue> = devices
        .iter()
        .map(|d| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [d.longitude, d.latitude],
                },
                "properties": {
                    "name": d.name,
                    "dev_eui": d.dev_eui,
                    "status": if d.active { "Active" } else { "Inactive" },
                    "marker-color": if d.active { ACTIVE_COLOR } else { INACTIVE_COLOR },
                },
            })
        })
        .collect();

    let (lat, lon) = map_center(devices);
    json!({
        "type": "FeatureCollection",
        "center": [lon, lat],
        "features": features,
    })
}
