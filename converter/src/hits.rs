//! Hit record builder.
//!
//! Consumes the raw or digitized hit bank of one event and produces one
//! observable row per hit: time-of-flight-corrected time, reweighted
//! photoelectron count and, in raw mode, the photon history tallies plus the
//! ad-hoc digitized equivalents. The two modes are mutually exclusive per
//! run.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digitizer::Digitizer;
use crate::geometry::{DetectorGeometry, GeometryError, PmtType, N_PMT_TYPES};
use crate::input::{RawHit, SimEvent, TriggerBank};
use crate::reweight::WeightCache;

#[derive(Debug, Error)]
pub enum HitError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("raw hit on PMT {id} ({pmt_type:?}) has no photons")]
    EmptyRawHit { pmt_type: PmtType, id: usize },
}

/// Which hit bank a run consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMode {
    /// True photon hits, with the ad-hoc digitizer applied on the side.
    Raw,
    /// Hits already passed through the front-end electronics emulation.
    Digitized,
}

/// Raw-mode-only columns of a hit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtras {
    /// Photons in this hit that underwent at least one reflection.
    #[serde(rename = "nReflec")]
    pub n_reflec: u32,
    /// Photons with at least one Rayleigh scatter.
    #[serde(rename = "nRaySct")]
    pub n_ray_sct: u32,
    /// Photons with at least one Mie scatter.
    #[serde(rename = "nMieSct")]
    pub n_mie_sct: u32,
    /// True emission time of the earliest photon (ns).
    #[serde(rename = "photonStartTime")]
    pub photon_start_time: f64,
    /// Photoelectron count after ad-hoc digitization, reweighted.
    #[serde(rename = "nPE_digi")]
    pub n_pe_digi: f64,
    /// Time-of-flight-corrected time after ad-hoc digitization (ns).
    #[serde(rename = "timetof_digi")]
    pub time_tof_digi: f64,
}

/// One row of the `hitRate_pmtType{0,1}` tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRateRecord {
    /// Always 1: one row per photon/digitized pulse.
    #[serde(rename = "nHits")]
    pub n_hits: f64,
    /// Reweighted photoelectron count.
    #[serde(rename = "nPE")]
    pub n_pe: f64,
    /// Hit time minus time-of-flight (ns).
    #[serde(rename = "timetof")]
    pub time_tof: f64,
    #[serde(rename = "PMT_id")]
    pub pmt_id: usize,
    /// Combined reweight factor applied to the photoelectron count.
    pub weight: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawExtras>,
}

/// Trigger alignment extracted from a bank's trigger-info vector: positions
/// 1 and 2 when at least 3 entries are present, otherwise both 0.
pub fn trigger_offsets(bank: &TriggerBank) -> (f64, f64) {
    if bank.trigger_info.len() >= 3 {
        (bank.trigger_info[1], bank.trigger_info[2])
    } else {
        (0.0, 0.0)
    }
}

/// Converts the hit banks of one event into observable rows.
pub struct HitRecordBuilder<'a> {
    geometry: &'a DetectorGeometry,
    weights: &'a WeightCache,
    source_position: Vector3<f64>,
    group_velocity_cm_per_ns: f64,
    mode: HitMode,
    separated_triggers: bool,
    modular_enabled: bool,
    digitizers: [&'a dyn Digitizer; N_PMT_TYPES],
}

impl<'a> HitRecordBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        geometry: &'a DetectorGeometry,
        weights: &'a WeightCache,
        source_position: Vector3<f64>,
        group_velocity_cm_per_ns: f64,
        mode: HitMode,
        separated_triggers: bool,
        modular_enabled: bool,
        digitizers: [&'a dyn Digitizer; N_PMT_TYPES],
    ) -> Self {
        HitRecordBuilder {
            geometry,
            weights,
            source_position,
            group_velocity_cm_per_ns,
            mode,
            separated_triggers,
            modular_enabled,
            digitizers,
        }
    }

    fn time_of_flight(&self, pmt_type: PmtType, id: usize) -> Result<f64, HitError> {
        let pmt = self.geometry.pmt(pmt_type, id)?;
        let distance = (pmt.position - self.source_position).norm();
        Ok(distance / self.group_velocity_cm_per_ns)
    }

    /// Convert one event into per-type rows.
    ///
    /// With separated triggers, a type is skipped entirely for this event
    /// when the *other* type's trigger-info vector is non-empty; the two
    /// triggers are mutually exclusive per event, not per element.
    pub fn convert_event(
        &self,
        event: &SimEvent,
        rng: &mut dyn rand::RngCore,
    ) -> Result<[Vec<HitRateRecord>; N_PMT_TYPES], HitError> {
        let mut out: [Vec<HitRateRecord>; N_PMT_TYPES] = [Vec::new(), Vec::new()];

        for pmt_type in PmtType::ALL {
            if pmt_type == PmtType::Modular && !self.modular_enabled {
                continue;
            }
            if self.separated_triggers
                && !event.bank(pmt_type.other()).trigger_info.is_empty()
            {
                continue;
            }

            let bank = event.bank(pmt_type);
            let rows = &mut out[pmt_type.index()];
            match self.mode {
                HitMode::Raw => {
                    for hit in &bank.raw_hits {
                        rows.push(self.convert_raw_hit(pmt_type, hit, rng)?);
                    }
                }
                HitMode::Digitized => {
                    let (shift, time) = trigger_offsets(bank);
                    for hit in &bank.digi_hits {
                        let tof = self.time_of_flight(pmt_type, hit.tube_id)?;
                        let weight = self.weights.get(pmt_type, hit.tube_id);
                        rows.push(HitRateRecord {
                            n_hits: 1.0,
                            n_pe: hit.charge * weight,
                            time_tof: hit.time - tof + time - shift,
                            pmt_id: hit.tube_id,
                            weight,
                            raw: None,
                        });
                    }
                }
            }
        }

        Ok(out)
    }

    fn convert_raw_hit(
        &self,
        pmt_type: PmtType,
        hit: &RawHit,
        rng: &mut dyn rand::RngCore,
    ) -> Result<HitRateRecord, HitError> {
        let first = hit.photons.first().ok_or(HitError::EmptyRawHit {
            pmt_type,
            id: hit.tube_id,
        })?;

        let tof = self.time_of_flight(pmt_type, hit.tube_id)?;
        let time_tof = first.true_time - tof;
        let n_pe = hit.photons.len() as f64;

        // tally the photon history over the hit; unambiguous only when the
        // hit holds a single photon
        let n_reflec = hit.photons.iter().filter(|p| p.reflections > 0).count() as u32;
        let n_ray_sct = hit
            .photons
            .iter()
            .filter(|p| p.rayleigh_scatters > 0)
            .count() as u32;
        let n_mie_sct = hit.photons.iter().filter(|p| p.mie_scatters > 0).count() as u32;

        let (digi_pe, digi_time) =
            self.digitizers[pmt_type.index()].digitize(n_pe, time_tof, rng);

        let weight = self.weights.get(pmt_type, hit.tube_id);
        Ok(HitRateRecord {
            n_hits: 1.0,
            n_pe: n_pe * weight,
            time_tof,
            pmt_id: hit.tube_id,
            weight,
            raw: Some(RawExtras {
                n_reflec,
                n_ray_sct,
                n_mie_sct,
                photon_start_time: first.start_time,
                n_pe_digi: digi_pe * weight,
                time_tof_digi: digi_time,
            }),
        })
    }
}
