// frontend/src/charts.rs
//
// Line-chart buffers for guiding error, focus HFD and cooling. Every series is
// a bounded ring buffer; the oldest point is evicted once the window is full.

use crate::config::ChartConfig;
use observatory_shared::ControlMessage;
use std::collections::VecDeque;

pub struct RingBuffer<T> {
    max: usize,
    buf: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            max,
            buf: VecDeque::with_capacity(max),
        }
    }

    /// Returns `true` when the push evicted the oldest item.
    pub fn push(&mut self, item: T) -> bool {
        let evicted = self.buf.len() == self.max;
        if evicted {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
        evicted
    }

    pub fn recent(&self, n: usize) -> Vec<&T> {
        self.buf.iter().rev().take(n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("max", &self.max)
            .field("len", &self.buf.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct ChartSeries {
    pub label: &'static str,
    pub color: &'static str,
    /// Separate y axis id, when the chart has more than one scale.
    pub y_axis: Option<&'static str>,
    points: RingBuffer<f64>,
}

impl ChartSeries {
    pub fn new(label: &'static str, color: &'static str, window: usize) -> Self {
        Self {
            label,
            color,
            y_axis: None,
            points: RingBuffer::new(window),
        }
    }

    fn on_axis(mut self, axis: &'static str) -> Self {
        self.y_axis = Some(axis);
        self
    }

    pub fn append(&mut self, value: f64) -> bool {
        self.points.push(value)
    }

    /// Points in arrival order, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().copied().collect()
    }

    pub fn last(&self) -> Option<f64> {
        self.points.recent(1).first().map(|v| **v)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug)]
pub struct Chart {
    pub title: &'static str,
    pub series: Vec<ChartSeries>,
    // bumped on every append so a renderer can tell when to redraw
    revision: u64,
}

impl Chart {
    fn new(title: &'static str, series: Vec<ChartSeries>) -> Self {
        Self {
            title,
            series,
            revision: 0,
        }
    }

    /// Appends one value per series (parallel arrays stay aligned).
    /// Returns `true` when any series evicted a point.
    pub fn append(&mut self, values: &[f64]) -> bool {
        self.revision += 1;
        self.series
            .iter_mut()
            .zip(values)
            .fold(false, |evicted, (s, v)| s.append(*v) | evicted)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn series(&self, label: &str) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.label == label)
    }
}

#[derive(Debug)]
pub struct Charts {
    pub guiding: Chart,
    pub focus: Chart,
    pub cooling: Chart,
}

impl Charts {
    pub fn new(cfg: &ChartConfig) -> Self {
        Self {
            guiding: Chart::new(
                "Guiding",
                vec![
                    ChartSeries::new("RA", "rgba(0,0,255,0.8)", cfg.guiding_window),
                    ChartSeries::new("DEC", "rgba(255,0,0,0.8)", cfg.guiding_window),
                ],
            ),
            focus: Chart::new(
                "Focus",
                vec![ChartSeries::new("HFD", "rgba(0,255,0,0.8)", cfg.focus_window).on_axis("hfd")],
            ),
            cooling: Chart::new(
                "Cooling",
                vec![
                    ChartSeries::new("Temperature", "rgba(0,0,255,0.8)", cfg.cooling_window)
                        .on_axis("temperature"),
                    ChartSeries::new("Power", "rgba(255,0,0,0.8)", cfg.cooling_window)
                        .on_axis("power"),
                ],
            ),
        }
    }

    /// Feeds a chart event into its buffer. Returns `false` for messages that
    /// are not chart data.
    pub fn ingest(&mut self, msg: &ControlMessage) -> bool {
        let evicted = match *msg {
            ControlMessage::GuidingError { ra, dec } => self.guiding.append(&[ra, dec]),
            ControlMessage::FocusHfd { hfd } => self.focus.append(&[hfd]),
            ControlMessage::CoolingStatus { temperature, power } => {
                self.cooling.append(&[temperature, power])
            }
            _ => return false,
        };
        if evicted {
            tracing::trace!("[CHART] window full, dropped oldest {} point", msg.event());
        }
        true
    }
}

impl Default for Charts {
    fn default() -> Self {
        Self::new(&ChartConfig::default())
    }
}
