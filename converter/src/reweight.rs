//! Multiplicative hit reweighting.
//!
//! Two independent, optional factors correct the simulated photoelectron
//! counts for effects absent from the simulation: the injector's
//! non-isotropic angular emission and a z-dependent variation of the water
//! attenuation length. Both are evaluated once per element during the
//! geometry pass and cached, so raw-hit mode looks the factor up instead of
//! recomputing it per hit.

use crate::geometry::{DetectorGeometry, PmtType, N_PMT_TYPES};
use crate::transform::PmtGeomRecord;

/// Angular emission profile of the injection source.
///
/// Takes the element direction in source-local spherical coordinates and
/// returns a multiplicative weight.
pub trait AngularProfile {
    fn weight(&self, source_cos: f64, source_phi: f64) -> f64;
}

/// Gaussian opening-angle emission profile of the UK diffuser, with an
/// optional first-harmonic azimuthal modulation.
#[derive(Debug, Clone)]
pub struct DiffuserProfile {
    /// Gaussian width of the emission in opening angle (radians).
    pub sigma: f64,
    /// Relative amplitude of the cos(phi) modulation.
    pub phi_amplitude: f64,
}

impl Default for DiffuserProfile {
    fn default() -> Self {
        DiffuserProfile {
            sigma: 40.0_f64.to_radians(),
            phi_amplitude: 0.0,
        }
    }
}

impl AngularProfile for DiffuserProfile {
    fn weight(&self, source_cos: f64, source_phi: f64) -> f64 {
        let theta = source_cos.clamp(-1.0, 1.0).acos();
        let gauss = (-0.5 * (theta / self.sigma).powi(2)).exp();
        gauss * (1.0 + self.phi_amplitude * source_phi.cos())
    }
}

/// Water attenuation lengths at the given wavelength (cm), before the
/// run-level ABWFF/RAYFF scale factors. Smooth stand-ins for the
/// simulation's tabulated optical data; only the combined coefficient scale
/// enters the reweight.
fn absorption_length_cm(wavelength_nm: f64) -> f64 {
    6600.0 * (wavelength_nm / 400.0).powi(2)
}

fn rayleigh_length_cm(wavelength_nm: f64) -> f64 {
    10833.0 * (wavelength_nm / 400.0).powi(4)
}

/// Position-dependent attenuation-length reweight.
///
/// The nominal simulation attenuates with a constant coefficient
/// α₀ = 1/(ABWFF·L_abs) + 1/(RAYFF·L_ray). This model lets the coefficient
/// vary linearly with depth, α(z) = α₀(1 + slope·z), and weights each
/// element by the ratio of the path-averaged transmission to the nominal
/// one. For a straight path from the source at depth z₀ to an element at
/// z-offset dz the average coefficient is α₀(1 + slope·(z₀ + dz/2)), so the
/// event vertex enters only through its global z.
#[derive(Debug, Clone)]
pub struct AttenuationZ {
    alpha0: f64,
    slope: f64,
    source_z: f64,
}

impl AttenuationZ {
    pub fn new(wavelength_nm: f64, source_z: f64, slope: f64, abwff: f64, rayff: f64) -> Self {
        let alpha0 = 1.0 / (abwff * absorption_length_cm(wavelength_nm))
            + 1.0 / (rayff * rayleigh_length_cm(wavelength_nm));
        AttenuationZ {
            alpha0,
            slope,
            source_z,
        }
    }

    /// Weight for an element at `distance` (cm) and z-offset `dz` (cm) from
    /// the source.
    pub fn weight(&self, distance: f64, dz: f64) -> f64 {
        (-distance * self.alpha0 * self.slope * (self.source_z + 0.5 * dz)).exp()
    }
}

/// The two optional reweight factors, strictly multiplicative.
#[derive(Default)]
pub struct ReweightChain {
    pub angular: Option<Box<dyn AngularProfile>>,
    pub attenuation: Option<AttenuationZ>,
}

impl ReweightChain {
    /// Combined factor for one element; each disabled stage contributes 1.
    pub fn factor(&self, rec: &PmtGeomRecord) -> f64 {
        let mut weight = 1.0;
        if let Some(profile) = &self.angular {
            weight *= profile.weight(rec.source_cos, rec.source_phi);
        }
        if let Some(atten) = &self.attenuation {
            weight *= atten.weight(rec.distance, rec.z_offset);
        }
        weight
    }
}

/// Per-element cache of the combined reweight factor, indexed by element
/// type and id. Filled during the geometry pass, valid for the whole run.
#[derive(Debug, Clone)]
pub struct WeightCache {
    factors: [Vec<f64>; N_PMT_TYPES],
}

impl WeightCache {
    pub fn new(geometry: &DetectorGeometry) -> Self {
        WeightCache {
            factors: [
                vec![1.0; geometry.count(PmtType::Single)],
                vec![1.0; geometry.count(PmtType::Modular)],
            ],
        }
    }

    pub fn set(&mut self, pmt_type: PmtType, id: usize, factor: f64) {
        self.factors[pmt_type.index()][id] = factor;
    }

    pub fn get(&self, pmt_type: PmtType, id: usize) -> f64 {
        self.factors[pmt_type.index()][id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(distance: f64, source_cos: f64, source_phi: f64, dz: f64) -> PmtGeomRecord {
        PmtGeomRecord {
            distance,
            incidence_cos: 1.0,
            source_cos,
            source_phi,
            module_cos: 1.0,
            module_phi: 0.0,
            solid_angle: 0.1,
            z_offset: dz,
            pmt_id: 0,
            module_pmt_id: 0,
            weight: 1.0,
        }
    }

    #[test]
    fn disabled_chain_is_unity() {
        let chain = ReweightChain::default();
        assert_relative_eq!(chain.factor(&record(100.0, 0.5, 0.3, 20.0)), 1.0);
    }

    #[test]
    fn chain_is_product_of_independent_factors() {
        let rec = record(800.0, 0.8, -0.4, 150.0);
        let profile = DiffuserProfile::default();
        let atten = AttenuationZ::new(400.0, 0.0, 1e-4, 1.3, 0.75);

        let expected_angular = profile.weight(rec.source_cos, rec.source_phi);
        let expected_atten = atten.weight(rec.distance, rec.z_offset);

        let both = ReweightChain {
            angular: Some(Box::new(profile.clone())),
            attenuation: Some(atten.clone()),
        };
        assert_relative_eq!(
            both.factor(&rec),
            expected_angular * expected_atten,
            epsilon = 1e-12
        );

        // disabling either factor fixes it to 1 without touching the other
        let angular_only = ReweightChain {
            angular: Some(Box::new(profile)),
            attenuation: None,
        };
        assert_relative_eq!(angular_only.factor(&rec), expected_angular, epsilon = 1e-12);

        let atten_only = ReweightChain {
            angular: None,
            attenuation: Some(atten),
        };
        assert_relative_eq!(atten_only.factor(&rec), expected_atten, epsilon = 1e-12);
    }

    #[test]
    fn diffuser_profile_peaks_on_axis() {
        let profile = DiffuserProfile::default();
        let on_axis = profile.weight(1.0, 0.0);
        assert_relative_eq!(on_axis, 1.0, epsilon = 1e-12);
        assert!(profile.weight(0.5, 0.0) < on_axis);
        assert!(profile.weight(0.0, 0.0) < profile.weight(0.5, 0.0));
    }

    #[test]
    fn attenuation_weight_is_unity_at_zero_offset_or_slope() {
        let atten = AttenuationZ::new(400.0, 0.0, 1e-4, 1.3, 0.75);
        assert_relative_eq!(atten.weight(500.0, 0.0), 1.0, epsilon = 1e-12);
        let flat = AttenuationZ::new(400.0, 0.0, 0.0, 1.3, 0.75);
        assert_relative_eq!(flat.weight(500.0, 300.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn attenuation_weight_is_positive_and_monotone_in_dz() {
        let atten = AttenuationZ::new(400.0, 0.0, 1e-4, 1.3, 0.75);
        let up = atten.weight(1000.0, 500.0);
        let down = atten.weight(1000.0, -500.0);
        assert!(up > 0.0 && down > 0.0);
        // positive slope shortens the attenuation length above the source
        assert!(up < 1.0 && down > 1.0);
    }

    #[test]
    fn cache_lookup_round_trip() {
        use crate::input::{GeometrySpec, PmtSpec};
        let spec = GeometrySpec {
            half_length: 100.0,
            radius: [25.0, 4.0],
            pmts_per_module: 19,
            single: vec![
                PmtSpec {
                    position: [0.0, 0.0, 0.0],
                    orientation: [0.0, 0.0, 1.0]
                };
                2
            ],
            modular: vec![],
        };
        let geo = DetectorGeometry::from_spec(&spec).unwrap();
        let mut cache = WeightCache::new(&geo);
        assert_relative_eq!(cache.get(PmtType::Single, 1), 1.0);
        cache.set(PmtType::Single, 1, 0.42);
        assert_relative_eq!(cache.get(PmtType::Single, 1), 0.42);
    }
}
