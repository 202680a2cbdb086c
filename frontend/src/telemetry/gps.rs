// frontend/src/telemetry/gps.rs
//
// GPS panel view model. Each `gpspanel` sample only touches the readouts
// whose fields it carries; everything else keeps the previous value.

use super::dms::to_dms;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, Utc};
use observatory_shared::{FixQuality, Satellite, TelemetrySample};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapMarker {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpsPanel {
    pub time: String,
    pub raw_time: String,

    pub marker: Option<MapMarker>,
    pub lat_dms: String,
    pub lon_dms: String,
    pub altitude: Option<f64>,

    pub mode: Option<i64>,
    pub fix: FixQuality,
    pub blink: bool,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,

    pub satellites: Vec<Satellite>,
    pub used_count: usize,
    pub visible_count: usize,

    /// Base64 PNGs as received.
    pub sschart: Option<String>,
    pub skymap: Option<String>,
}

impl Default for GpsPanel {
    fn default() -> Self {
        Self {
            time: String::new(),
            raw_time: String::new(),
            marker: None,
            lat_dms: String::new(),
            lon_dms: String::new(),
            altitude: None,
            mode: None,
            fix: FixQuality::Waiting,
            blink: true,
            hdop: None,
            vdop: None,
            satellites: Vec::new(),
            used_count: 0,
            visible_count: 0,
            sschart: None,
            skymap: None,
        }
    }
}

/// `YYYY-MM-DDThh:mm:ss` in UTC. Unparseable input is returned unchanged.
pub fn format_gps_time(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%dT%H:%M:%S";

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return t.with_timezone(&Utc).format(OUT).to_string();
    }
    // gpsd without an offset is already UTC
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return t.format(OUT).to_string();
    }
    tracing::debug!("[GPS] unparseable gpstime {raw:?}");
    raw.to_string()
}

impl GpsPanel {
    pub fn apply(&mut self, sample: &TelemetrySample) {
        if let Some(raw) = sample.gpstime.as_deref() {
            self.raw_time = raw.to_string();
            self.time = format_gps_time(raw);
        }

        if let (Some(lat), Some(lon)) = (sample.latitude, sample.longitude) {
            self.marker = Some(MapMarker { lat, lon });
            self.lat_dms = to_dms(lat);
            self.lon_dms = to_dms(lon);
        }
        if sample.altitude.is_some() {
            self.altitude = sample.altitude;
        }

        if let Some(mode) = sample.mode {
            self.mode = Some(mode);
            self.fix = FixQuality::from_mode(mode);
            self.blink = !self.fix.has_fix();
        }
        if sample.hdop.is_some() {
            self.hdop = sample.hdop;
        }
        if sample.vdop.is_some() {
            self.vdop = sample.vdop;
        }

        if let Some(sats) = &sample.satellites {
            self.used_count = sats.iter().filter(|s| s.used).count();
            self.visible_count = sats.len();
            self.satellites = sats.clone();
        }

        if let Some(img) = &sample.sschart {
            self.sschart = Some(img.clone());
        }
        if let Some(img) = &sample.skymap {
            self.skymap = Some(img.clone());
        }

        tracing::trace!(
            "[GPS] fix={} sats={}/{}",
            self.fix,
            self.used_count,
            self.visible_count
        );
    }

    pub fn sschart_png(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.sschart.as_deref().map(decode_image)
    }

    pub fn skymap_png(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.skymap.as_deref().map(decode_image)
    }
}

/// Accepts a bare base64 payload or a `data:image/png;base64,` URL.
fn decode_image(b64: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let body = match b64.split_once("base64,") {
        Some((_, rest)) => rest,
        None => b64,
    };
    STANDARD.decode(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(prn: i64, used: bool) -> Satellite {
        Satellite {
            prn,
            el: Some(45.0),
            az: Some(120.0),
            ss: Some(38.0),
            used,
        }
    }

    #[test]
    fn fix_mode_drives_indicator() {
        let mut panel = GpsPanel::default();
        for (mode, text, blink) in [(0, "waiting...", true), (1, "waiting...", true), (2, "2D", false), (3, "3D", false)] {
            panel.apply(&TelemetrySample {
                mode: Some(mode),
                ..TelemetrySample::default()
            });
            assert_eq!(panel.fix.as_str(), text);
            assert_eq!(panel.blink, blink);
        }
    }

    #[test]
    fn coordinates_render_as_dms() {
        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample {
            latitude: Some(-33.865),
            longitude: Some(151.209),
            ..TelemetrySample::default()
        });
        assert_eq!(panel.lat_dms, "-33:51:54.0000");
        assert_eq!(panel.lon_dms, "151:12:32.4000");
        assert_eq!(panel.marker, Some(MapMarker { lat: -33.865, lon: 151.209 }));
    }

    #[test]
    fn missing_coordinate_keeps_previous_text() {
        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample {
            latitude: Some(-33.865),
            longitude: Some(151.209),
            ..TelemetrySample::default()
        });
        panel.apply(&TelemetrySample {
            latitude: Some(10.0),
            longitude: None,
            mode: Some(3),
            ..TelemetrySample::default()
        });
        assert_eq!(panel.lat_dms, "-33:51:54.0000");
        assert_eq!(panel.lon_dms, "151:12:32.4000");
        assert_eq!(panel.fix, FixQuality::ThreeD);
    }

    #[test]
    fn zero_latitude_is_a_position() {
        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample {
            latitude: Some(0.0),
            longitude: Some(0.0),
            ..TelemetrySample::default()
        });
        assert_eq!(panel.lat_dms, "0:00:00.0000");
        assert!(panel.marker.is_some());
    }

    #[test]
    fn satellites_counted_and_all_rows_kept() {
        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample {
            satellites: Some(vec![sat(3, true), sat(7, false), sat(19, true)]),
            ..TelemetrySample::default()
        });
        assert_eq!(panel.used_count, 2);
        assert_eq!(panel.visible_count, 3);
        assert_eq!(panel.satellites.len(), 3);
    }

    #[test]
    fn gps_time_is_reformatted_to_utc() {
        assert_eq!(format_gps_time("2024-03-05T07:04:09.000Z"), "2024-03-05T07:04:09");
        assert_eq!(format_gps_time("2024-03-05T09:04:09+02:00"), "2024-03-05T07:04:09");
        assert_eq!(format_gps_time("2024-03-05T07:04:09"), "2024-03-05T07:04:09");
        assert_eq!(format_gps_time("garbage"), "garbage");

        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample::default());
        assert!(panel.time.is_empty());
    }

    #[test]
    fn images_decode_from_base64() {
        let mut panel = GpsPanel::default();
        panel.apply(&TelemetrySample {
            sschart: Some("data:image/png;base64,iVBORw==".into()),
            ..TelemetrySample::default()
        });
        let png = panel.sschart_png().unwrap().unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
        assert!(panel.skymap_png().is_none());
    }
}
