use crate::types::{Coordinate, MapContext, Row, StyleChoice, TileStyle};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use html_escape::encode_text;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

const LEAFLET_VERSION: &str = "1.9.4";
const AWESOME_MARKERS_VERSION: &str = "2.0.2";
const FONT_AWESOME_VERSION: &str = "4.7.0";

/// Resolved rows of one valid sheet, with the style chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayer {
    pub sheet: String,
    pub rows: Vec<Row>,
    pub style: StyleChoice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub popup: String,
    pub tooltip: String,
    pub style: StyleChoice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapGroup {
    pub sheet: String,
    pub name: String, // layer-control entry: color swatch + sheet name
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerControl {
    pub collapsed: bool,
}

/// A complete map, ready to be written as a standalone HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub center: Coordinate,
    pub zoom: u8,
    pub tiles: TileStyle,
    pub groups: Vec<MapGroup>,
    pub layer_control: LayerControl,
}

pub fn assemble(context: &MapContext, layers: Vec<SheetLayer>) -> MapDocument {
    let groups = layers
        .into_iter()
        .map(|layer| {
            let markers = layer
                .rows
                .into_iter()
                .map(|row| Marker {
                    position: row.position,
                    tooltip: row.label.clone(),
                    popup: row.label,
                    style: layer.style,
                })
                .collect();
            MapGroup {
                name: group_name(&layer.sheet, layer.style),
                sheet: layer.sheet,
                markers,
            }
        })
        .collect();

    MapDocument {
        center: context.center,
        zoom: context.zoom,
        tiles: context.tiles.unwrap_or_default(),
        groups,
        layer_control: LayerControl { collapsed: false },
    }
}

pub fn group_name(sheet: &str, style: StyleChoice) -> String {
    format!(
        "<span style=\"background-color:{}; border-radius:50%; width:15px; height:15px; display:inline-block;\"></span> {}",
        style.color,
        encode_text(sheet)
    )
}

impl MapDocument {
    pub fn marker_count(&self) -> usize {
        self.groups.iter().map(|g| g.markers.len()).sum()
    }

    /// Data consumed by the page script. Labels are escaped here since
    /// Leaflet inserts popup and tooltip content as HTML.
    fn payload(&self) -> serde_json::Value {
        let groups: Vec<serde_json::Value> = self
            .groups
            .iter()
            .map(|group| {
                let markers: Vec<serde_json::Value> = group
                    .markers
                    .iter()
                    .map(|m| {
                        json!({
                            "location": [m.position.y(), m.position.x()],
                            "popup": encode_text(&m.popup),
                            "tooltip": encode_text(&m.tooltip),
                            "icon": {
                                "markerColor": m.style.color.as_str(),
                                "icon": m.style.icon.as_str(),
                                "prefix": "fa",
                            },
                        })
                    })
                    .collect();
                json!({ "name": group.name, "markers": markers })
            })
            .collect();

        json!({
            "center": [self.center.y(), self.center.x()],
            "zoom": self.zoom,
            "tiles": {
                "url": self.tiles.url(),
                "attribution": self.tiles.attribution(),
            },
            "groups": groups,
            "layerControl": { "collapsed": self.layer_control.collapsed },
        })
    }

    pub fn to_html(&self) -> String {
        // "</" would close the script element early.
        let payload = self.payload().to_string().replace("</", "<\\/");
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Carte interactive</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.css" />
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/{fa}/css/font-awesome.min.css" />
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/{am}/leaflet.awesome-markers.css" />
  <script src="https://unpkg.com/leaflet@{leaflet}/dist/leaflet.js"></script>
  <script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/{am}/leaflet.awesome-markers.js"></script>
  <style>
    html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
    #map {{ position: absolute; top: 0; bottom: 0; right: 0; left: 0; }}
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const data = {payload};
    const map = L.map("map").setView(data.center, data.zoom);
    L.tileLayer(data.tiles.url, {{ attribution: data.tiles.attribution, maxZoom: 19 }}).addTo(map);
    const overlays = {{}};
    for (const group of data.groups) {{
      const layer = L.featureGroup();
      for (const marker of group.markers) {{
        L.marker(marker.location, {{ icon: L.AwesomeMarkers.icon(marker.icon) }})
          .bindPopup(marker.popup)
          .bindTooltip(marker.tooltip)
          .addTo(layer);
      }}
      layer.addTo(map);
      overlays[group.name] = layer;
    }}
    L.control.layers(null, overlays, {{ collapsed: data.layerControl.collapsed }}).addTo(map);
  </script>
</body>
</html>
"#,
            leaflet = LEAFLET_VERSION,
            fa = FONT_AWESOME_VERSION,
            am = AWESOME_MARKERS_VERSION,
            payload = payload,
        )
    }

    /// One Point feature per marker.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .groups
            .iter()
            .flat_map(|group| {
                group.markers.iter().map(move |m| {
                    let mut properties = JsonObject::new();
                    properties.insert("sheet".to_string(), json!(group.sheet));
                    properties.insert("label".to_string(), json!(m.popup));
                    properties.insert("color".to_string(), json!(m.style.color.as_str()));
                    properties.insert("icon".to_string(), json!(m.style.icon.as_str()));
                    Feature {
                        bbox: None,
                        geometry: Some(Geometry::new(Value::Point(vec![
                            m.position.x(),
                            m.position.y(),
                        ]))),
                        id: None,
                        properties: Some(properties),
                        foreign_members: None,
                    }
                })
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_html())
            .with_context(|| format!("Failed to write map: {:?}", path))?;
        info!(
            "Wrote {} markers in {} groups to {:?}",
            self.marker_count(),
            self.groups.len(),
            path
        );
        Ok(())
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_geojson())
            .context("Failed to serialize GeoJSON")?;
        fs::write(path, content).with_context(|| format!("Failed to write GeoJSON: {:?}", path))?;
        info!("Wrote GeoJSON export to {:?}", path);
        Ok(())
    }
}
