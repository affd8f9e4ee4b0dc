//! Playback timemap as produced by the rendering engine

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TimePoint {
    /// Milliseconds from the start of playback
    pub tstamp: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub off: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qstamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(rename = "measureOn", default, skip_serializing_if = "Option::is_none")]
    pub measure_on: Option<String>,
}

impl TimePoint {
    pub fn new(tstamp: f64, on: &[&str], off: &[&str]) -> Self {
        Self {
            tstamp,
            on: on.iter().map(|s| s.to_string()).collect(),
            off: off.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// Time points sorted by non-decreasing timestamp
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "Vec<TimePoint>", into = "Vec<TimePoint>")]
pub struct Timemap {
    points: Vec<TimePoint>,
}

impl TryFrom<Vec<TimePoint>> for Timemap {
    type Error = SyncError;

    fn try_from(points: Vec<TimePoint>) -> SyncResult<Self> {
        Self::new(points)
    }
}

impl From<Timemap> for Vec<TimePoint> {
    fn from(timemap: Timemap) -> Self {
        timemap.points
    }
}

impl Timemap {
    /// Build a timemap, restoring timestamp order if the engine sent it unsorted
    pub fn new(mut points: Vec<TimePoint>) -> SyncResult<Self> {
        if let Some(bad) = points.iter().find(|p| p.tstamp < 0.0 || p.tstamp.is_nan()) {
            return Err(SyncError::Config(format!("invalid timestamp {}", bad.tstamp)));
        }
        if points.windows(2).any(|w| w[0].tstamp > w[1].tstamp) {
            log::warn!("Timemap: time points out of order, sorting {} points", points.len());
            points.sort_by(|a, b| a.tstamp.total_cmp(&b.tstamp));
        }
        Ok(Self { points })
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Config(format!("timemap: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimePoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    /// Smallest index whose timestamp is at least `t`, or `len()` when none is
    pub fn first_at_or_after(&self, t: f64) -> usize {
        self.points.partition_point(|p| p.tstamp < t)
    }

    /// Index of the last point that carries any onset
    pub fn last_onset_index(&self) -> Option<usize> {
        self.points.iter().rposition(|p| !p.on.is_empty())
    }

    /// Timestamp of the first onset of `id`
    pub fn time_of(&self, id: &str) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.on.iter().any(|o| o == id))
            .map(|p| p.tstamp)
    }

    /// First index after `from` whose offsets include `id`
    pub fn offset_after(&self, id: &str, from: usize) -> Option<usize> {
        (from + 1..self.points.len()).find(|&i| self.points[i].off.iter().any(|o| o == id))
    }

    pub fn final_tstamp(&self) -> Option<f64> {
        self.points.last().map(|p| p.tstamp)
    }
}

/// Playback identifier -> identifiers notated on the page
///
/// Expanded repeats play one notated element several times under different
/// identifiers; the first entry is the one present in the rendering.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ExpansionAliasMap(pub HashMap<String, Vec<String>>);

impl ExpansionAliasMap {
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.0
            .get(id)
            .and_then(|ids| ids.first())
            .map(String::as_str)
            .unwrap_or(id)
    }
}
