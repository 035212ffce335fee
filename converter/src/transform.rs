//! Per-element geometric transform.
//!
//! For every element relative to the injection source: distance, incidence
//! angle, source-local spherical coordinates, solid angle, module-relative
//! angles and z-offset. One output record per element, written to the
//! `pmt_type{0,1}` tables and reused by the reweighting chain.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geometry::{DetectorGeometry, GeometryError, PmtType};
use crate::source::Source;

/// Exact solid angle subtended by a disk of radius `radius` seen face-on
/// from `distance` along the line of centers: 2π(1 − d/√(d²+r²)).
///
/// Flat-disk approximation; the incidence angle is deliberately not folded
/// in, matching the convention of the downstream fit.
pub fn disk_solid_angle(radius: f64, distance: f64) -> f64 {
    2.0 * std::f64::consts::PI
        * (1.0 - distance / (distance * distance + radius * radius).sqrt())
}

/// One row of the `pmt_type{0,1}` tables: the source-relative geometry of a
/// single element. Field names in the persisted store are kept via serde
/// renames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmtGeomRecord {
    /// Distance to the source (cm).
    #[serde(rename = "R")]
    pub distance: f64,
    /// Cosine of the photon incidence angle on the element.
    #[serde(rename = "costh")]
    pub incidence_cos: f64,
    /// Cosine of the element direction relative to the source axis.
    #[serde(rename = "cosths")]
    pub source_cos: f64,
    /// Azimuth of the element in the source-local frame.
    #[serde(rename = "phis")]
    pub source_phi: f64,
    /// Incidence cosine relative to the module's central element
    /// (equals `costh` for single-type and central elements).
    #[serde(rename = "costhm")]
    pub module_cos: f64,
    /// Azimuth of the photon arrival around the element axis, referenced to
    /// the module's central element (0 for single-type and central elements).
    #[serde(rename = "phim")]
    pub module_phi: f64,
    /// Solid angle subtended by the element (sr).
    #[serde(rename = "omega")]
    pub solid_angle: f64,
    /// Element z minus source z (cm).
    #[serde(rename = "dz")]
    pub z_offset: f64,
    #[serde(rename = "PMT_id")]
    pub pmt_id: usize,
    /// Sub-index within the module; fixed dummy 0 for single-type elements.
    #[serde(rename = "mPMT_id")]
    pub module_pmt_id: usize,
    /// Combined reweighting factor (1 with all reweights disabled).
    pub weight: f64,
}

fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    // degenerate inputs have no defined angle; 0 keeps the record finite
    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return 0.0;
    }
    let cos = a.dot(b) / denom;
    cos.clamp(-1.0, 1.0).acos()
}

/// Compute the source-relative geometry record of one element.
pub fn observe_pmt(
    geometry: &DetectorGeometry,
    source: &Source,
    pmt_type: PmtType,
    id: usize,
) -> Result<PmtGeomRecord, GeometryError> {
    let pmt = geometry.pmt(pmt_type, id)?;

    let relative = pmt.position - source.position;
    let distance = relative.norm();
    let unit_rel = relative / distance;
    let orientation = pmt.orientation.normalize();

    // positive when the photon arrives from outside against the outward normal
    let incidence_cos = -unit_rel.dot(&orientation);
    let source_cos = unit_rel.dot(&source.direction);
    let source_phi = unit_rel
        .dot(&source.local_y)
        .atan2(unit_rel.dot(&source.local_x));

    let solid_angle = disk_solid_angle(geometry.radius(pmt_type), distance);

    let mut module_cos = incidence_cos;
    let mut module_phi = 0.0;
    if pmt_type == PmtType::Modular && !geometry.is_central(pmt_type, id) {
        let central = geometry.pmt(pmt_type, geometry.central_index(id))?;
        module_cos = -unit_rel.dot(&central.orientation);

        // Project the central-element offset and the reversed photon
        // direction onto the plane perpendicular to this element's axis;
        // the angle between the projections is the azimuth of the arrival
        // direction referenced to where the central element sits. The
        // ordering of the two cross products fixes the sign convention.
        let central_offset = central.position - pmt.position;
        let reference = orientation.cross(&central_offset);
        let arrival = orientation.cross(&(-unit_rel));
        module_phi = angle_between(&reference, &arrival);
    }

    Ok(PmtGeomRecord {
        distance,
        incidence_cos,
        source_cos,
        source_phi,
        module_cos,
        module_phi,
        solid_angle,
        z_offset: pmt.position.z - source.position.z,
        pmt_id: id,
        module_pmt_id: geometry.module_pmt_id(pmt_type, id),
        weight: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{GeometrySpec, PmtSpec};
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f64::consts::PI;

    #[rstest]
    #[case(1.0, 10.0)]
    #[case(25.0, 300.0)]
    #[case(4.0, 50.0)]
    fn solid_angle_limits(#[case] radius: f64, #[case] distance: f64) {
        let omega = disk_solid_angle(radius, distance);
        assert!(omega > 0.0 && omega < 2.0 * PI);
        // monotonically decreasing in distance
        assert!(disk_solid_angle(radius, distance * 2.0) < omega);
        // limits: 2π up close, 0 far away
        assert_relative_eq!(disk_solid_angle(radius, 1e-9), 2.0 * PI, epsilon = 1e-6);
        assert_relative_eq!(disk_solid_angle(radius, 1e9), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn solid_angle_reference_value() {
        // radius 1 at distance 10: 2π(1 − 10/√101)
        assert_relative_eq!(disk_solid_angle(1.0, 10.0), 0.31277, epsilon = 1e-4);
    }

    fn single_pmt_geometry() -> GeometrySpec {
        GeometrySpec {
            half_length: 100.0,
            radius: [1.0, 1.0],
            pmts_per_module: 19,
            single: vec![PmtSpec {
                position: [0.0, 0.0, 10.0],
                orientation: [0.0, 0.0, -1.0],
            }],
            modular: vec![],
        }
    }

    #[test]
    fn head_on_element_observables() {
        let geo = DetectorGeometry::from_spec(&single_pmt_geometry()).unwrap();
        // endcap source at the bottom cap firing up +z toward the element
        let source = Source::from_vertex(nalgebra::Vector3::new(0.0, 0.0, -95.0), 100.0);
        // move the element far up so the source looks straight at it
        let rec = observe_pmt(&geo, &source, PmtType::Single, 0).unwrap();
        assert_relative_eq!(rec.distance, 105.0, epsilon = 1e-12);
        assert_relative_eq!(rec.incidence_cos, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rec.source_cos, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rec.z_offset, 105.0, epsilon = 1e-12);
        assert_eq!(rec.module_pmt_id, 0);
        assert_relative_eq!(rec.module_phi, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rec.module_cos, rec.incidence_cos, epsilon = 1e-12);
        assert_relative_eq!(rec.weight, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn angle_cosines_stay_in_range() {
        let mut modular = Vec::new();
        for i in 0..38 {
            let angle = i as f64 * 0.33;
            modular.push(PmtSpec {
                position: [60.0 * angle.cos(), 60.0 * angle.sin(), -20.0 + i as f64],
                orientation: [-angle.cos(), -angle.sin(), 0.1],
            });
        }
        let spec = GeometrySpec {
            half_length: 100.0,
            radius: [25.0, 4.0],
            pmts_per_module: 19,
            single: vec![PmtSpec {
                position: [0.0, -60.0, 5.0],
                orientation: [0.0, 1.0, 0.0],
            }],
            modular,
        };
        let geo = DetectorGeometry::from_spec(&spec).unwrap();
        let source = Source::from_vertex(nalgebra::Vector3::new(55.0, 0.0, 3.0), 100.0);

        for pmt_type in PmtType::ALL {
            for id in 0..geo.count(pmt_type) {
                let rec = observe_pmt(&geo, &source, pmt_type, id).unwrap();
                assert!(rec.incidence_cos >= -1.0 && rec.incidence_cos <= 1.0);
                assert!(rec.source_cos >= -1.0 && rec.source_cos <= 1.0);
                assert!(rec.module_cos >= -1.0 && rec.module_cos <= 1.0);
                assert!(rec.solid_angle >= 0.0);
                assert!((0.0..=PI).contains(&rec.module_phi));
            }
        }
    }

    #[test]
    fn module_phi_finite_when_axis_points_at_central() {
        // Peripheral element whose axis runs along the central-element
        // offset: the reference projection collapses to the zero vector and
        // the azimuth degenerates to 0 rather than NaN.
        let mut modular = vec![
            PmtSpec {
                position: [0.0, 0.0, 0.0],
                orientation: [1.0, 0.0, 0.0],
            };
            19
        ];
        modular[18] = PmtSpec {
            position: [1.0, 0.0, 0.0],
            orientation: [1.0, 0.0, 0.0],
        };
        let spec = GeometrySpec {
            half_length: 1000.0,
            radius: [1.0, 1.0],
            pmts_per_module: 19,
            single: vec![],
            modular,
        };
        let geo = DetectorGeometry::from_spec(&spec).unwrap();
        let source = Source::from_vertex(nalgebra::Vector3::new(0.0, -50.0, 0.0), 1000.0);

        let rec = observe_pmt(&geo, &source, PmtType::Modular, 0).unwrap();
        assert!(rec.module_phi.is_finite());
        assert_relative_eq!(rec.module_phi, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn module_phi_reference_construction() {
        // Element at the origin looking up +z, central element offset along
        // +x. A photon arriving along +y lands a quarter turn away from the
        // central-element reference in the element plane.
        let mut modular = vec![
            PmtSpec {
                position: [0.0, 0.0, 0.0],
                orientation: [0.0, 0.0, 1.0],
            };
            19
        ];
        modular[18] = PmtSpec {
            position: [1.0, 0.0, 0.0],
            orientation: [0.0, 0.0, 1.0],
        };
        let spec = GeometrySpec {
            half_length: 1000.0,
            radius: [1.0, 1.0],
            pmts_per_module: 19,
            single: vec![],
            modular,
        };
        let geo = DetectorGeometry::from_spec(&spec).unwrap();
        // barrel source placed so the photon travels along +y to the element
        let source = Source::from_vertex(nalgebra::Vector3::new(0.0, -50.0, 0.0), 1000.0);

        let rec = observe_pmt(&geo, &source, PmtType::Modular, 0).unwrap();
        assert_relative_eq!(rec.module_phi, PI / 2.0, epsilon = 1e-12);
        // the central element itself keeps the dummy convention
        let central = observe_pmt(&geo, &source, PmtType::Modular, 18).unwrap();
        assert_relative_eq!(central.module_phi, 0.0, epsilon = 1e-12);
        assert_relative_eq!(central.module_cos, central.incidence_cos, epsilon = 1e-12);
    }
}
