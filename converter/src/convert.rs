//! Conversion pipeline driver.
//!
//! One deterministic batch pass: load geometry and run options, derive the
//! source from the first event's vertex, run the geometry pass (filling the
//! per-element tables and the reweight cache), then loop over the selected
//! event range converting hit banks into observable rows.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::digitizer::{ChargeTimeSmear, Digitizer};
use crate::geometry::{DetectorGeometry, GeometryError, PmtType};
use crate::hits::{HitError, HitMode, HitRateRecord, HitRecordBuilder};
use crate::input::SimulationFile;
use crate::reweight::{AngularProfile, AttenuationZ, DiffuserProfile, ReweightChain, WeightCache};
use crate::source::Source;
use crate::transform::{observe_pmt, PmtGeomRecord};
use crate::velocity::group_velocity_cm_per_ns;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("run options metadata is empty")]
    EmptyOptions,

    #[error("input contains no events")]
    NoEvents,

    #[error(transparent)]
    Hit(#[from] HitError),
}

/// Run configuration for one conversion pass.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Laser wavelength in nm.
    pub wavelength_nm: f64,
    /// Apply the source angular-profile reweight.
    pub diffuser_profile: bool,
    /// Apply the z-dependent attenuation reweight with this slope.
    pub attenuation_slope: Option<f64>,
    /// Water parameter: absorption length scale factor.
    pub abwff: f64,
    /// Water parameter: Rayleigh scattering length scale factor.
    pub rayff: f64,
    /// Process the module-type elements (disabled by the `-b` flag).
    pub modular_enabled: bool,
    /// Which hit bank to consume.
    pub mode: HitMode,
    /// Enforce per-event trigger exclusivity between the two types.
    pub separated_triggers: bool,
    /// First event to process.
    pub start_event: usize,
    /// One past the last event; only applied when within the event count.
    pub end_event: Option<usize>,
    /// RNG seed for the ad-hoc digitizer.
    pub seed: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            wavelength_nm: 400.0,
            diffuser_profile: false,
            attenuation_slope: None,
            abwff: 1.3,
            rayff: 0.75,
            modular_enabled: true,
            mode: HitMode::Digitized,
            separated_triggers: false,
            start_event: 0,
            end_event: None,
            seed: 0,
        }
    }
}

/// The four persisted output tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputTables {
    /// Source-relative geometry per element, one table per type.
    #[serde(rename = "pmt_type0")]
    pub pmt_geom_type0: Vec<PmtGeomRecord>,
    #[serde(rename = "pmt_type1")]
    pub pmt_geom_type1: Vec<PmtGeomRecord>,
    /// Observable hit rows, one table per type.
    #[serde(rename = "hitRate_pmtType0")]
    pub hit_rate_type0: Vec<HitRateRecord>,
    #[serde(rename = "hitRate_pmtType1")]
    pub hit_rate_type1: Vec<HitRateRecord>,
}

impl OutputTables {
    pub fn pmt_geom(&self, pmt_type: PmtType) -> &[PmtGeomRecord] {
        match pmt_type {
            PmtType::Single => &self.pmt_geom_type0,
            PmtType::Modular => &self.pmt_geom_type1,
        }
    }

    pub fn hit_rate(&self, pmt_type: PmtType) -> &[HitRateRecord] {
        match pmt_type {
            PmtType::Single => &self.hit_rate_type0,
            PmtType::Modular => &self.hit_rate_type1,
        }
    }
}

/// Run the whole conversion over a simulation file.
pub fn run_conversion(
    file: &SimulationFile,
    config: &ConvertConfig,
) -> Result<OutputTables, ConvertError> {
    let geometry = DetectorGeometry::from_spec(&file.geometry)?;
    if file.options.is_empty() {
        return Err(ConvertError::EmptyOptions);
    }

    // all calibration events of a run share one injection point
    let first = file.events.first().ok_or(ConvertError::NoEvents)?;
    let source = Source::from_vertex(nalgebra::Vector3::from(first.vertex), geometry.half_length());
    info!(
        "source at ({:.1}, {:.1}, {:.1}), mount {:?}",
        source.position.x, source.position.y, source.position.z, source.mount
    );

    let vg = group_velocity_cm_per_ns(config.wavelength_nm);
    info!(
        "wavelength {} nm, group velocity {:.4} cm/ns",
        config.wavelength_nm, vg
    );

    let chain = ReweightChain {
        angular: config
            .diffuser_profile
            .then(|| Box::new(DiffuserProfile::default()) as Box<dyn AngularProfile>),
        attenuation: config.attenuation_slope.map(|slope| {
            AttenuationZ::new(
                config.wavelength_nm,
                source.position.z,
                slope,
                config.abwff,
                config.rayff,
            )
        }),
    };

    // geometry pass: per-element tables plus the reweight cache
    let mut weights = WeightCache::new(&geometry);
    let mut pmt_geom: [Vec<PmtGeomRecord>; 2] = [Vec::new(), Vec::new()];
    for pmt_type in PmtType::ALL {
        if pmt_type == PmtType::Modular && !config.modular_enabled {
            continue;
        }
        for id in 0..geometry.count(pmt_type) {
            let mut rec = observe_pmt(&geometry, &source, pmt_type, id)?;
            let factor = chain.factor(&rec);
            rec.weight = factor;
            weights.set(pmt_type, id, factor);
            pmt_geom[pmt_type.index()].push(rec);
        }
    }
    debug!(
        "geometry pass done: {} + {} elements",
        pmt_geom[0].len(),
        pmt_geom[1].len()
    );

    let digitizers = [
        ChargeTimeSmear::for_type(PmtType::Single),
        ChargeTimeSmear::for_type(PmtType::Modular),
    ];
    let builder = HitRecordBuilder::new(
        &geometry,
        &weights,
        source.position,
        vg,
        config.mode,
        config.separated_triggers,
        config.modular_enabled,
        [
            &digitizers[0] as &dyn Digitizer,
            &digitizers[1] as &dyn Digitizer,
        ],
    );

    let mut n_events = file.events.len();
    if let Some(end) = config.end_event {
        if end > 0 && end <= n_events {
            n_events = end;
        }
    }
    let start = config.start_event.min(n_events);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut hit_rate: [Vec<HitRateRecord>; 2] = [Vec::new(), Vec::new()];
    for (ev, event) in file.events[start..n_events].iter().enumerate() {
        debug!("event {}", start + ev);
        let rows = builder.convert_event(event, &mut rng)?;
        for (table, mut new_rows) in hit_rate.iter_mut().zip(rows) {
            table.append(&mut new_rows);
        }
    }
    info!(
        "converted {} events: {} + {} hit rows",
        n_events - start,
        hit_rate[0].len(),
        hit_rate[1].len()
    );

    let [pmt_geom_type0, pmt_geom_type1] = pmt_geom;
    let [hit_rate_type0, hit_rate_type1] = hit_rate;
    Ok(OutputTables {
        pmt_geom_type0,
        pmt_geom_type1,
        hit_rate_type0,
        hit_rate_type1,
    })
}
