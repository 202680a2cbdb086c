// frontend/src/skymap/config.rs
//
// One-time sky map options. Nothing here changes after `SkyMap::configure`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarLayer {
    pub show: bool,
    /// Faintest magnitude drawn.
    pub limit: f64,
    pub colors: bool,
    pub names: bool,
    pub proper: bool,
    pub desig: bool,
    pub namelimit: f64,
    pub propernamelimit: f64,
    /// Largest star radius, px.
    pub size: f64,
    pub exponent: f64,
    pub data: String,
}

impl Default for StarLayer {
    fn default() -> Self {
        Self {
            show: true,
            limit: 6.0,
            colors: false,
            names: false,
            proper: true,
            desig: false,
            namelimit: 2.5,
            propernamelimit: 1.5,
            size: 7.0,
            exponent: -0.28,
            data: "stars.6.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsoLayer {
    pub show: bool,
    pub limit: f64,
    pub names: bool,
    pub desig: bool,
    pub namelimit: f64,
    /// `None` reuses the star size.
    pub size: Option<f64>,
    pub exponent: f64,
    pub data: String,
}

impl Default for DsoLayer {
    fn default() -> Self {
        Self {
            show: true,
            limit: 6.0,
            names: true,
            desig: true,
            namelimit: 4.0,
            size: None,
            exponent: 1.4,
            data: "dsos.bright.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstellationLayer {
    pub show: bool,
    pub names: bool,
    pub desig: bool,
    pub lines: bool,
    pub bounds: bool,
}

impl Default for ConstellationLayer {
    fn default() -> Self {
        Self {
            show: true,
            names: true,
            desig: true,
            lines: true,
            bounds: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLayer {
    pub show: bool,
    pub stroke: String,
    pub width: f64,
    pub opacity: f64,
}

impl LineLayer {
    fn new(show: bool, stroke: &str, width: f64, opacity: f64) -> Self {
        Self {
            show,
            stroke: stroke.to_string(),
            width,
            opacity,
        }
    }
}

impl Default for LineLayer {
    fn default() -> Self {
        Self::new(false, "#cccccc", 1.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLines {
    pub graticule: LineLayer,
    pub equatorial: LineLayer,
    pub ecliptic: LineLayer,
    pub galactic: LineLayer,
    pub supergalactic: LineLayer,
}

impl Default for GridLines {
    fn default() -> Self {
        Self {
            graticule: LineLayer::new(true, "#cccccc", 0.6, 0.8),
            equatorial: LineLayer::new(true, "#aaaaaa", 1.3, 0.7),
            ecliptic: LineLayer::new(true, "#66cc66", 1.3, 0.7),
            galactic: LineLayer::new(false, "#cc6666", 1.3, 0.7),
            supergalactic: LineLayer::new(false, "#cc66cc", 1.3, 0.7),
        }
    }
}

/// Circle/label parameters of the point overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// radius = (size * radius_scale) ^ radius_exponent
    pub radius_scale: f64,
    pub radius_exponent: f64,
    /// Minimum distance, px, between two placed labels.
    pub proximity_limit: f64,
    /// Added to the radius on both axes when placing a label.
    pub label_offset: f64,
    pub point_stroke: String,
    pub point_fill: String,
    pub text_fill: String,
    pub text_font: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            radius_scale: 0.25,
            radius_exponent: 0.5,
            proximity_limit: 20.0,
            label_offset: 2.0,
            point_stroke: "rgba(255, 0, 204, 1)".to_string(),
            point_fill: "rgba(255, 0, 204, 0.15)".to_string(),
            text_fill: "rgba(255, 0, 204, 1)".to_string(),
            text_font: "normal bold 15px Helvetica, Arial, sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Relative to `datapath` unless absolute.
    pub file: String,
    /// Only features whose `properties.type` matches are drawn.
    pub feature_type: String,
    pub style: OverlayStyle,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            file: "stars.6.json".to_string(),
            feature_type: "snr".to_string(),
            style: OverlayStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyMapConfig {
    /// 0 = full parent width.
    pub width: f64,
    pub projection: String,
    pub transform: String,
    /// `[ra hours, dec degrees, orientation degrees]`
    pub center: Option<[f64; 3]>,
    pub orientation_fixed: bool,
    pub adaptable: bool,
    pub interactive: bool,
    pub form: bool,
    pub location: bool,
    pub controls: bool,
    pub lang: String,
    pub container: String,
    pub datapath: String,
    pub stars: StarLayer,
    pub dsos: DsoLayer,
    pub constellations: ConstellationLayer,
    pub milky_way: bool,
    pub lines: GridLines,
    pub overlay: OverlayConfig,
}

impl Default for SkyMapConfig {
    fn default() -> Self {
        Self {
            width: 0.0,
            projection: "aitoff".to_string(),
            transform: "equatorial".to_string(),
            center: None,
            orientation_fixed: true,
            adaptable: true,
            interactive: true,
            form: false,
            location: false,
            controls: true,
            lang: String::new(),
            container: "celestial-map".to_string(),
            datapath: "/static/json/stardata/".to_string(),
            stars: StarLayer::default(),
            dsos: DsoLayer::default(),
            constellations: ConstellationLayer::default(),
            milky_way: true,
            lines: GridLines::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl SkyMapConfig {
    /// Path of the overlay file on the server.
    pub fn overlay_path(&self) -> String {
        let file = &self.overlay.file;
        if file.starts_with('/') || file.contains("://") {
            return file.clone();
        }
        if self.datapath.ends_with('/') || self.datapath.is_empty() {
            format!("{}{file}", self.datapath)
        } else {
            format!("{}/{file}", self.datapath)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_layout() {
        let cfg = SkyMapConfig::default();
        assert_eq!(cfg.projection, "aitoff");
        assert_eq!(cfg.stars.exponent, -0.28);
        assert!(cfg.lines.ecliptic.show && !cfg.lines.galactic.show);
        assert_eq!(cfg.overlay_path(), "/static/json/stardata/stars.6.json");
        assert_eq!(cfg.overlay.style.proximity_limit, 20.0);
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let cfg: SkyMapConfig =
            serde_json::from_str(r#"{"projection":"stereographic","overlay":{"feature_type":"pn"}}"#)
                .unwrap();
        assert_eq!(cfg.projection, "stereographic");
        assert_eq!(cfg.overlay.feature_type, "pn");
        assert_eq!(cfg.overlay.file, "stars.6.json");
        assert_eq!(cfg.datapath, "/static/json/stardata/");
    }
}
