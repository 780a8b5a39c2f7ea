//! Standalone Leaflet page generation.

use crate::center_of;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

const ZOOM_START: u8 = 11;
const RADIUS: u8 = 15;
const BLUR: u8 = 12;
const MAX_ZOOM: u8 = 13;
const MIN_OPACITY: f64 = 0.3;

/// Color stops from cold to hot.
const GRADIENT: &[(&str, &str)] = &[
    ("0.0", "rgba(0, 0, 255, 0)"),
    ("0.2", "rgba(0, 255, 255, 0.5)"),
    ("0.4", "rgba(0, 255, 0, 0.6)"),
    ("0.6", "rgba(255, 255, 0, 0.7)"),
    ("0.8", "rgba(255, 128, 0, 0.8)"),
    ("1.0", "rgba(255, 0, 0, 0.9)"),
];

/// Renders `points` as a full HTML document with a dark basemap and a heat
/// layer, centered on their mean coordinate.
///
/// With no points the page still renders, showing only the basemap.
#[must_use]
pub fn render_heatmap(points: &[(f64, f64)]) -> String {
    let (center_lat, center_lon) = center_of(points);

    let data = format!(
        "[{}]",
        points
            .iter()
            .map(|(lat, lon)| format!("[{lat},{lon}]"))
            .collect::<Vec<_>>()
            .join(",")
    );

    let gradient = GRADIENT
        .iter()
        .map(|(stop, color)| format!("{stop}: \"{color}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let heat_layer = if points.is_empty() {
        String::new()
    } else {
        format!(
            "L.heatLayer(points, {{radius: {RADIUS}, blur: {BLUR}, maxZoom: {MAX_ZOOM}, \
             minOpacity: {MIN_OPACITY}, gradient: {{{gradient}}}}}).addTo(map);"
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="{LEAFLET_CSS}">
<script src="{LEAFLET_JS}"></script>
<script src="{LEAFLET_HEAT_JS}"></script>
<style>html, body, #map {{ width: 100%; height: 100%; margin: 0; padding: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{center_lat}, {center_lon}], {ZOOM_START});
L.tileLayer("{TILE_URL}", {{attribution: '{TILE_ATTRIBUTION}', subdomains: "abcd", maxZoom: 20}}).addTo(map);
var points = {data};
{heat_layer}
</script>
</body>
</html>
"#
    )
}

/// Renders the page shown when the map cannot be produced.
#[must_use]
pub fn render_error(message: &str) -> String {
    format!(
        "<html><body><h2>Error loading map: {}</h2></body></html>",
        escape(message)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_embeds_points_and_layer_settings() {
        let html = render_heatmap(&[(41.9, -87.6), (41.8, -87.7)]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("var points = [[41.9,-87.6],[41.8,-87.7]];"));
        assert!(html.contains("radius: 15, blur: 12, maxZoom: 13"));
        assert!(html.contains("minOpacity: 0.3"));
        assert!(html.contains("1.0: \"rgba(255, 0, 0, 0.9)\""));
        assert!(html.contains("dark_all"));
        assert!(html.contains("], 11);"));
    }

    #[test]
    fn empty_page_is_centered_on_default() {
        let html = render_heatmap(&[]);
        assert!(html.contains("setView([41.8781, -87.6298], 11)"));
        assert!(html.contains("var points = [];"));
        assert!(!html.contains("L.heatLayer"));
    }

    #[test]
    fn error_page_escapes_message() {
        assert_eq!(
            render_error("bad <date>"),
            "<html><body><h2>Error loading map: bad &lt;date&gt;</h2></body></html>"
        );
    }
}
