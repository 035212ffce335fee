//! Ad-hoc front-end digitization contract.
//!
//! The geometric core only ever sees the digitizer through a narrow
//! charge/time transform, one independent instance per element type. The
//! default implementation below is a simple Gaussian smear standing in for
//! the full front-end emulation; anything implementing [`Digitizer`] can be
//! injected instead.

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::geometry::PmtType;

/// Pure charge/time transform applied to a hit: `(pe, time) → (pe', time')`.
pub trait Digitizer {
    fn digitize(&self, pe: f64, time: f64, rng: &mut dyn RngCore) -> (f64, f64);
}

/// Gaussian charge smear (σ ∝ √pe) plus Gaussian time jitter, with a charge
/// threshold below which the hit digitizes to zero.
#[derive(Debug, Clone)]
pub struct ChargeTimeSmear {
    /// Single-photoelectron charge resolution (fraction of √pe).
    pub charge_resolution: f64,
    /// Single-photoelectron transit-time spread (ns).
    pub time_resolution: f64,
    /// Minimum digitized charge (pe); smaller charges are zeroed.
    pub threshold: f64,
}

impl ChargeTimeSmear {
    /// Default parameters for the given element type: the large box-and-line
    /// tubes are noisier than the small module tubes.
    pub fn for_type(pmt_type: PmtType) -> ChargeTimeSmear {
        match pmt_type {
            PmtType::Single => ChargeTimeSmear {
                charge_resolution: 0.5,
                time_resolution: 1.5,
                threshold: 0.25,
            },
            PmtType::Modular => ChargeTimeSmear {
                charge_resolution: 0.35,
                time_resolution: 0.9,
                threshold: 0.25,
            },
        }
    }
}

impl Digitizer for ChargeTimeSmear {
    fn digitize(&self, pe: f64, time: f64, rng: &mut dyn RngCore) -> (f64, f64) {
        let zq: f64 = rng.sample(StandardNormal);
        let zt: f64 = rng.sample(StandardNormal);

        let mut charge = pe + zq * self.charge_resolution * pe.abs().sqrt();
        if charge < self.threshold {
            charge = 0.0;
        }
        // time jitter tightens with the number of photoelectrons
        let jitter = self.time_resolution / pe.abs().max(1.0).sqrt();
        (charge, time + zt * jitter)
    }
}
