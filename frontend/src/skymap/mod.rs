// frontend/src/skymap/mod.rs
//
// Sky map adapter: fixed configuration plus a point overlay (one feature
// subtype) drawn as circles with de-duplicated labels.

pub mod config;
pub mod overlay;
pub mod quadtree;
pub mod render;

pub use config::{OverlayStyle, SkyMapConfig};
pub use overlay::{Feature, FeatureCollection};
pub use render::{DrawOp, Equirectangular, Projection};

use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct SkyMap {
    config: SkyMapConfig,
    features: Vec<Feature>,
}

impl SkyMap {
    pub fn configure(config: SkyMapConfig) -> Self {
        tracing::info!(
            "[SKY] projection={} transform={} overlay={} ({})",
            config.projection,
            config.transform,
            config.overlay_path(),
            config.overlay.feature_type
        );
        Self {
            config,
            features: Vec::new(),
        }
    }

    pub fn config(&self) -> &SkyMapConfig {
        &self.config
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Replaces the overlay with the configured subtype out of `fc`.
    pub fn set_overlay(&mut self, fc: FeatureCollection) -> usize {
        let total = fc.features.len();
        self.features = fc.filter_type(&self.config.overlay.feature_type);
        tracing::debug!(
            "[SKY] overlay: {} of {total} features are {}",
            self.features.len(),
            self.config.overlay.feature_type
        );
        self.features.len()
    }

    pub fn load_overlay_file(&mut self, path: &Path) -> Result<usize> {
        let fc = overlay::load_overlay_file(path)?;
        Ok(self.set_overlay(fc))
    }

    /// Fetches the overlay from the device server's static data path.
    pub async fn load_overlay(&mut self, client: &reqwest::Client, base_http: &str) -> Result<usize> {
        let path = self.config.overlay_path();
        let url = if path.contains("://") {
            path
        } else {
            format!("{}{path}", base_http.trim_end_matches('/'))
        };
        let fc = overlay::fetch_overlay(client, &url).await?;
        Ok(self.set_overlay(fc))
    }

    pub fn redraw(&self, proj: &dyn Projection) -> Vec<DrawOp> {
        render::redraw(&self.features, proj, &self.config.overlay.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_is_filtered_on_load() {
        let mut path = std::env::temp_dir();
        path.push(format!("obs-overlay-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"name":"Crab","dim":7,"type":"snr"},
                 "geometry":{"type":"Point","coordinates":[83.63,22.01]}},
                {"type":"Feature","properties":{"name":"M31","dim":190,"type":"s"},
                 "geometry":{"type":"Point","coordinates":[10.68,41.27]}}
            ]}"#,
        )
        .unwrap();

        let mut map = SkyMap::configure(SkyMapConfig::default());
        assert_eq!(map.load_overlay_file(&path).unwrap(), 1);

        let ops = map.redraw(&Equirectangular {
            width: 720.0,
            height: 360.0,
        });
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[1], DrawOp::Label { text, .. } if text == "Crab"));
        let _ = std::fs::remove_file(&path);
    }
}
