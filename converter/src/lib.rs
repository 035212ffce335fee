//! Conversion of simulated photon-detection records into PMT-relative
//! geometric and timing observables.
//!
//! A light-injection calibration run consists of a fixed detector geometry,
//! one injection source (diffuser or collimator) and a batch of simulated
//! events. This crate derives, for every photon-sensing element relative to
//! the source, its distance, incidence angles, subtended solid angle and
//! time-of-flight-corrected hit times, and applies optional multiplicative
//! reweighting for the source angular emission profile and a z-dependent
//! attenuation length. The output is the four-table store consumed by the
//! calibration fit.
//!
//! The pipeline is a single deterministic batch pass: geometry and the
//! reweight models are loaded once, then one loop over events with one
//! element loop per event. See [`convert::run_conversion`].

pub mod convert;
pub mod digitizer;
pub mod geometry;
pub mod hits;
pub mod input;
pub mod reweight;
pub mod source;
pub mod transform;
pub mod velocity;

pub use convert::{run_conversion, ConvertConfig, ConvertError, OutputTables};
pub use geometry::{DetectorGeometry, GeometryError, Pmt, PmtType};
pub use hits::{HitMode, HitRateRecord};
pub use source::Source;
pub use transform::PmtGeomRecord;
