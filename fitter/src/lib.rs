//! Binned observable container and goodness-of-fit statistics.
//!
//! The calibration fit compares binned distributions of PMT-relative
//! observables against a prediction. This crate holds the fit-facing event
//! record, the binning scheme, the per-sample container with its
//! prediction/data histograms and the two supported test statistics. The
//! container supports the iteration protocol of the outer fit driver:
//! weights are reset to the original MC weight, multiplied by
//! parameter-dependent corrections and the histograms re-filled, without
//! rebuilding the event collection.

pub mod binning;
pub mod event;
pub mod loader;
pub mod sample;
pub mod stats;

pub use binning::{BinManager, BinningError};
pub use event::{FieldTag, FitEvent};
pub use loader::{sample_from_tables, LoaderError};
pub use sample::Sample;
pub use stats::{StatError, Statistic};
