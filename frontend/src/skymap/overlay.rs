// frontend/src/skymap/overlay.rs
//
// GeoJSON point overlay: `{type:"FeatureCollection", features:[...]}` with
// `properties.{name, dim, type}` and `[lon, lat]` point coordinates.

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: FeatureProperties,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub name: String,
    /// Angular size, arcminutes. Number or numeric string.
    #[serde(default)]
    pub dim: Value,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl Feature {
    /// `[lon, lat]` of a point geometry.
    pub fn point(&self) -> Option<[f64; 2]> {
        if self.geometry.kind != "Point" {
            return None;
        }
        let c = self.geometry.coordinates.as_array()?;
        Some([c.first()?.as_f64()?, c.get(1)?.as_f64()?])
    }

    /// Integer part of the declared size; leading digits of a string count.
    pub fn dim_int(&self) -> Option<i64> {
        match &self.properties.dim {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => {
                let s = s.trim();
                let end = s
                    .char_indices()
                    .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                    .map(|(i, _)| i)
                    .unwrap_or(s.len());
                s[..end].parse().ok()
            }
            _ => None,
        }
    }

    pub fn is_type(&self, kind: &str) -> bool {
        self.properties.kind.as_deref() == Some(kind)
    }
}

impl FeatureCollection {
    pub fn from_json(text: &str) -> Result<Self> {
        let fc: FeatureCollection = serde_json::from_str(text)?;
        if !fc.kind.is_empty() && fc.kind != "FeatureCollection" {
            return Err(DashboardError::Protocol(format!(
                "expected a FeatureCollection, got {}",
                fc.kind
            )));
        }
        Ok(fc)
    }

    /// Keeps only features of one subtype, in file order.
    pub fn filter_type(self, kind: &str) -> Vec<Feature> {
        self.features.into_iter().filter(|f| f.is_type(kind)).collect()
    }
}

pub fn load_overlay_file(path: &Path) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path)?;
    FeatureCollection::from_json(&text)
}

pub async fn fetch_overlay(client: &reqwest::Client, url: &str) -> Result<FeatureCollection> {
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    FeatureCollection::from_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type":"Feature","id":"Crab","properties":{"name":"Crab","dim":"7x5","type":"snr"},
             "geometry":{"type":"Point","coordinates":[83.63,22.01]}},
            {"type":"Feature","id":"Ring","properties":{"name":"Ring","dim":1.4,"type":"pn"},
             "geometry":{"type":"Point","coordinates":[-76.6,33.03]}},
            {"type":"Feature","id":"Veil","properties":{"name":"Veil","dim":180,"type":"snr"},
             "geometry":{"type":"Point","coordinates":[-48.0,30.7]}}
        ]
    }"#;

    #[test]
    fn filter_keeps_order_and_subtype() {
        let snrs = FeatureCollection::from_json(SAMPLE).unwrap().filter_type("snr");
        let names: Vec<_> = snrs.iter().map(|f| f.properties.name.as_str()).collect();
        assert_eq!(names, vec!["Crab", "Veil"]);
        assert_eq!(snrs[1].point(), Some([-48.0, 30.7]));
    }

    #[test]
    fn dim_is_parsed_like_an_integer() {
        let fc = FeatureCollection::from_json(SAMPLE).unwrap();
        assert_eq!(fc.features[0].dim_int(), Some(7));
        assert_eq!(fc.features[1].dim_int(), Some(1));
        assert_eq!(fc.features[2].dim_int(), Some(180));
    }

    #[test]
    fn wrong_document_type_is_rejected() {
        assert!(FeatureCollection::from_json(r#"{"type":"Feature","features":[]}"#).is_err());
        assert!(FeatureCollection::from_json("[]").is_err());
    }
}
