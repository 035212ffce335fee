//! Detector geometry model.
//!
//! Positions, orientations and radii of every photon-sensing element, loaded
//! once per run and read-only afterwards. Two element families exist: large
//! standalone PMTs and small PMTs grouped 19-to-a-module, with the last
//! element of each contiguous module block designated as the module's central
//! PMT.

use nalgebra::Vector3;
use thiserror::Error;

use crate::input::GeometrySpec;

/// Number of element types in the detector.
pub const N_PMT_TYPES: usize = 2;

/// Errors that can occur when loading or querying the detector geometry
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("detector geometry is empty")]
    EmptyGeometry,

    #[error("unknown PMT id {id} for type {pmt_type:?}")]
    UnknownPmt { pmt_type: PmtType, id: usize },

    #[error("module size must be at least 1")]
    InvalidModuleSize,
}

/// The two element families of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PmtType {
    /// Large standalone PMT (type 0 in the persisted tables).
    Single,
    /// Small PMT belonging to a multi-PMT module (type 1).
    Modular,
}

impl PmtType {
    pub const ALL: [PmtType; N_PMT_TYPES] = [PmtType::Single, PmtType::Modular];

    /// Table index of this type (0 = single, 1 = modular).
    pub fn index(self) -> usize {
        match self {
            PmtType::Single => 0,
            PmtType::Modular => 1,
        }
    }

    /// The other element type.
    pub fn other(self) -> PmtType {
        match self {
            PmtType::Single => PmtType::Modular,
            PmtType::Modular => PmtType::Single,
        }
    }
}

/// A single photon-sensing element.
#[derive(Debug, Clone)]
pub struct Pmt {
    /// Unique id within the element's type.
    pub id: usize,
    /// Position in detector coordinates (cm).
    pub position: Vector3<f64>,
    /// Outward normal of the sensitive surface.
    pub orientation: Vector3<f64>,
}

/// Immutable detector geometry: all elements of both types plus the
/// type-level constants needed by the geometric transform.
#[derive(Debug, Clone)]
pub struct DetectorGeometry {
    single: Vec<Pmt>,
    modular: Vec<Pmt>,
    radius: [f64; N_PMT_TYPES],
    half_length: f64,
    pmts_per_module: usize,
}

impl DetectorGeometry {
    /// Build the geometry from its persisted description.
    ///
    /// Fails with [`GeometryError::EmptyGeometry`] when the description holds
    /// no elements at all; geometry is a mandatory precondition for any
    /// computation.
    pub fn from_spec(spec: &GeometrySpec) -> Result<Self, GeometryError> {
        if spec.single.is_empty() && spec.modular.is_empty() {
            return Err(GeometryError::EmptyGeometry);
        }
        if spec.pmts_per_module == 0 {
            return Err(GeometryError::InvalidModuleSize);
        }

        let to_pmts = |specs: &[crate::input::PmtSpec]| -> Vec<Pmt> {
            specs
                .iter()
                .enumerate()
                .map(|(id, p)| Pmt {
                    id,
                    position: Vector3::from(p.position),
                    orientation: Vector3::from(p.orientation),
                })
                .collect()
        };

        Ok(DetectorGeometry {
            single: to_pmts(&spec.single),
            modular: to_pmts(&spec.modular),
            radius: spec.radius,
            half_length: spec.half_length,
            pmts_per_module: spec.pmts_per_module,
        })
    }

    /// Look up an element by type and id.
    pub fn pmt(&self, pmt_type: PmtType, id: usize) -> Result<&Pmt, GeometryError> {
        let pmts = match pmt_type {
            PmtType::Single => &self.single,
            PmtType::Modular => &self.modular,
        };
        pmts.get(id)
            .ok_or(GeometryError::UnknownPmt { pmt_type, id })
    }

    /// Number of elements of the given type.
    pub fn count(&self, pmt_type: PmtType) -> usize {
        match pmt_type {
            PmtType::Single => self.single.len(),
            PmtType::Modular => self.modular.len(),
        }
    }

    /// Sensitive-disk radius for the given type (cm).
    pub fn radius(&self, pmt_type: PmtType) -> f64 {
        self.radius[pmt_type.index()]
    }

    /// Half of the detector cylinder length (cm). Used to classify injection
    /// points as barrel- or endcap-mounted.
    pub fn half_length(&self) -> f64 {
        self.half_length
    }

    /// Number of small PMTs per module.
    pub fn pmts_per_module(&self) -> usize {
        self.pmts_per_module
    }

    /// Sub-index of the element within its module; 0 for single-type
    /// elements, which carry a fixed dummy value in the output tables.
    pub fn module_pmt_id(&self, pmt_type: PmtType, id: usize) -> usize {
        match pmt_type {
            PmtType::Single => 0,
            PmtType::Modular => id % self.pmts_per_module,
        }
    }

    /// Id of the central PMT of the module containing `id`. Modules occupy
    /// contiguous id blocks and the central PMT is the last index of a block.
    pub fn central_index(&self, id: usize) -> usize {
        (id / self.pmts_per_module) * self.pmts_per_module + self.pmts_per_module - 1
    }

    /// Whether the element is its module's central PMT. Single-type elements
    /// are their own reference and count as central.
    pub fn is_central(&self, pmt_type: PmtType, id: usize) -> bool {
        match pmt_type {
            PmtType::Single => true,
            PmtType::Modular => self.module_pmt_id(pmt_type, id) == self.pmts_per_module - 1,
        }
    }
}
