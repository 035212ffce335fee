//! Binning scheme over event observables.
//!
//! A bin is one `[low, high)` interval per axis; an event falls in the first
//! bin containing all of its selected field values. Bins may tile the space
//! irregularly, so lookup is a scan rather than an index computation.

use thiserror::Error;

use crate::event::{FieldTag, FitEvent};

#[derive(Debug, Error)]
pub enum BinningError {
    #[error("binning needs at least one axis")]
    NoAxes,

    #[error("bin {bin} has {got} intervals, expected {expected}")]
    DimensionMismatch {
        bin: usize,
        expected: usize,
        got: usize,
    },

    #[error("bin {bin} axis {axis} has low {low} >= high {high}")]
    EmptyInterval {
        bin: usize,
        axis: usize,
        low: f64,
        high: f64,
    },
}

/// Maps selected event fields to an integer bin.
#[derive(Debug, Clone)]
pub struct BinManager {
    axes: Vec<FieldTag>,
    bins: Vec<Vec<(f64, f64)>>,
}

impl BinManager {
    pub fn new(axes: Vec<FieldTag>, bins: Vec<Vec<(f64, f64)>>) -> Result<Self, BinningError> {
        if axes.is_empty() {
            return Err(BinningError::NoAxes);
        }
        for (i, bin) in bins.iter().enumerate() {
            if bin.len() != axes.len() {
                return Err(BinningError::DimensionMismatch {
                    bin: i,
                    expected: axes.len(),
                    got: bin.len(),
                });
            }
            for (axis, &(low, high)) in bin.iter().enumerate() {
                if low >= high {
                    return Err(BinningError::EmptyInterval {
                        bin: i,
                        axis,
                        low,
                        high,
                    });
                }
            }
        }
        Ok(BinManager { axes, bins })
    }

    /// One-dimensional binning from consecutive edges.
    pub fn from_edges(axis: FieldTag, edges: &[f64]) -> Result<Self, BinningError> {
        let bins = edges
            .windows(2)
            .map(|pair| vec![(pair[0], pair[1])])
            .collect();
        BinManager::new(vec![axis], bins)
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// First bin containing all of the event's selected values, if any.
    pub fn find_bin(&self, event: &FitEvent) -> Option<usize> {
        let values: Vec<f64> = self.axes.iter().map(|&tag| event.field(tag)).collect();
        self.bins.iter().position(|bin| {
            bin.iter()
                .zip(&values)
                .all(|(&(low, high), &v)| v >= low && v < high)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_dimensional_lookup() {
        let bm = BinManager::from_edges(FieldTag::TimeTof, &[0.0, 10.0, 20.0, 30.0]).unwrap();
        assert_eq!(bm.n_bins(), 3);

        let mut ev = FitEvent::new(0);
        ev.time_tof = 15.0;
        assert_eq!(bm.find_bin(&ev), Some(1));
        ev.time_tof = 0.0;
        assert_eq!(bm.find_bin(&ev), Some(0));
        // upper edge is exclusive
        ev.time_tof = 30.0;
        assert_eq!(bm.find_bin(&ev), None);
    }

    #[test]
    fn two_dimensional_lookup() {
        let bm = BinManager::new(
            vec![FieldTag::SourceCos, FieldTag::Distance],
            vec![
                vec![(0.0, 0.5), (0.0, 100.0)],
                vec![(0.5, 1.0), (0.0, 100.0)],
                vec![(0.0, 1.0), (100.0, 1000.0)],
            ],
        )
        .unwrap();

        let mut ev = FitEvent::new(0);
        ev.source_cos = 0.7;
        ev.distance = 50.0;
        assert_eq!(bm.find_bin(&ev), Some(1));
        ev.distance = 500.0;
        assert_eq!(bm.find_bin(&ev), Some(2));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let result = BinManager::new(
            vec![FieldTag::SourceCos, FieldTag::Distance],
            vec![vec![(0.0, 1.0)]],
        );
        assert!(matches!(
            result,
            Err(BinningError::DimensionMismatch { bin: 0, .. })
        ));
    }

    #[test]
    fn empty_interval_is_rejected() {
        let result = BinManager::from_edges(FieldTag::TimeTof, &[0.0, 0.0, 1.0]);
        assert!(matches!(result, Err(BinningError::EmptyInterval { .. })));
    }
}
