//! Serde model of the simulation input file.
//!
//! Mirrors the content of the simulated event store: detector geometry, run
//! options metadata and the per-event hit banks. The file carries two hit
//! banks per event, one per element type, each with its own trigger-info
//! vector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{PmtType, N_PMT_TYPES};

/// Persisted description of one photon-sensing element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmtSpec {
    pub position: [f64; 3],
    pub orientation: [f64; 3],
}

/// Persisted detector geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// Half of the detector cylinder length (cm).
    pub half_length: f64,
    /// Sensitive-disk radius per element type (cm).
    pub radius: [f64; N_PMT_TYPES],
    /// Number of small PMTs per module.
    #[serde(default = "default_pmts_per_module")]
    pub pmts_per_module: usize,
    /// Standalone large PMTs, indexed by id.
    #[serde(default)]
    pub single: Vec<PmtSpec>,
    /// Module-grouped small PMTs, indexed by id.
    #[serde(default)]
    pub modular: Vec<PmtSpec>,
}

fn default_pmts_per_module() -> usize {
    19
}

/// One detected photon within a raw hit. The first photon of a hit is the
/// earliest arrival and defines the hit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotonHit {
    /// True arrival time at the photocathode (ns).
    pub true_time: f64,
    /// True photon emission time (ns).
    pub start_time: f64,
    /// Number of reflections the photon underwent.
    #[serde(default)]
    pub reflections: u32,
    /// Number of Rayleigh scatters.
    #[serde(default)]
    pub rayleigh_scatters: u32,
    /// Number of Mie scatters.
    #[serde(default)]
    pub mie_scatters: u32,
}

/// A raw (true-photon) hit: all photons collected by one element in one
/// event. The photoelectron count is the number of photons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    /// Element id, 0-based, within the bank's element type.
    pub tube_id: usize,
    pub photons: Vec<PhotonHit>,
}

/// A hit already passed through the front-end electronics emulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigiHit {
    /// Element id, 0-based, within the bank's element type.
    pub tube_id: usize,
    /// Digitized charge in photoelectrons.
    pub charge: f64,
    /// Digitized time (ns).
    pub time: f64,
}

/// Per-type hit bank of one event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerBank {
    /// Trigger metadata vector; position 1 is the trigger shift and position
    /// 2 the trigger time when at least 3 entries are present.
    #[serde(default)]
    pub trigger_info: Vec<f64>,
    #[serde(default)]
    pub raw_hits: Vec<RawHit>,
    #[serde(default)]
    pub digi_hits: Vec<DigiHit>,
}

/// One simulated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    /// Primary vertex, the injection point (cm).
    pub vertex: [f64; 3],
    /// Hit banks indexed by element type (0 = single, 1 = modular).
    pub banks: [TriggerBank; N_PMT_TYPES],
}

impl SimEvent {
    pub fn bank(&self, pmt_type: PmtType) -> &TriggerBank {
        &self.banks[pmt_type.index()]
    }
}

/// The whole simulation input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationFile {
    pub geometry: GeometrySpec,
    /// Run options metadata. An empty map is treated the same as a missing
    /// options store: a fatal precondition failure.
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub events: Vec<SimEvent>,
}
