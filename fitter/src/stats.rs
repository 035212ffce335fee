//! Goodness-of-fit statistics over binned distributions.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatError {
    #[error("unknown statistic {0:?}, expected \"llh\" or \"chi2\"")]
    UnknownStatistic(String),
}

/// The two supported test statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Statistic {
    /// Poisson log-likelihood ratio: Σ d·ln(d/p) − (d − p).
    #[default]
    PoissonLlh,
    /// Pearson chi-square: Σ (d − p)²/p.
    ChiSquare,
}

impl FromStr for Statistic {
    type Err = StatError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "llh" | "poisson" => Ok(Statistic::PoissonLlh),
            "chi2" | "chisq" => Ok(Statistic::ChiSquare),
            other => Err(StatError::UnknownStatistic(other.to_string())),
        }
    }
}

impl Statistic {
    /// Evaluate the statistic over matching prediction and data histograms.
    ///
    /// Bins with an empty prediction are skipped; `0·ln 0 = 0` by
    /// convention. The result is non-negative and zero iff every bin's data
    /// equals its prediction.
    ///
    /// # Panics
    ///
    /// Panics when the two histograms have different lengths.
    pub fn evaluate(&self, pred: &[f64], data: &[f64]) -> f64 {
        assert_eq!(
            pred.len(),
            data.len(),
            "histogram length mismatch: {} prediction bins vs {} data bins",
            pred.len(),
            data.len()
        );
        let mut stat = 0.0;
        for (&p, &d) in pred.iter().zip(data) {
            if p <= 0.0 {
                continue;
            }
            match self {
                Statistic::PoissonLlh => {
                    stat += p - d;
                    if d > 0.0 {
                        stat += d * (d / p).ln();
                    }
                }
                Statistic::ChiSquare => {
                    stat += (d - p) * (d - p) / p;
                }
            }
        }
        stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Statistic::PoissonLlh)]
    #[case(Statistic::ChiSquare)]
    fn identical_histograms_give_zero(#[case] stat: Statistic) {
        let hist = vec![4.0, 0.0, 2.5, 100.0];
        assert_relative_eq!(stat.evaluate(&hist, &hist), 0.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(Statistic::PoissonLlh)]
    #[case(Statistic::ChiSquare)]
    fn mismatched_histograms_are_positive(#[case] stat: Statistic) {
        let pred = vec![4.0, 1.0, 2.5];
        let data = vec![3.0, 1.5, 2.5];
        assert!(stat.evaluate(&pred, &data) > 0.0);
    }

    #[test]
    fn chi_square_reference_value() {
        // single bin: (3-4)²/4
        assert_relative_eq!(
            Statistic::ChiSquare.evaluate(&[4.0], &[3.0]),
            0.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn poisson_llh_handles_empty_data_bins() {
        // d = 0 contributes p by convention
        assert_relative_eq!(
            Statistic::PoissonLlh.evaluate(&[2.0], &[0.0]),
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn empty_prediction_bins_are_skipped() {
        assert_relative_eq!(
            Statistic::ChiSquare.evaluate(&[0.0, 4.0], &[7.0, 4.0]),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    #[should_panic(expected = "histogram length mismatch")]
    fn mismatched_histogram_lengths_panic() {
        Statistic::PoissonLlh.evaluate(&[1.0, 2.0], &[1.0]);
    }

    #[test]
    fn statistic_parses_by_name() {
        assert_eq!("llh".parse::<Statistic>().unwrap(), Statistic::PoissonLlh);
        assert_eq!("Poisson".parse::<Statistic>().unwrap(), Statistic::PoissonLlh);
        assert_eq!("chi2".parse::<Statistic>().unwrap(), Statistic::ChiSquare);
        assert!("barlow".parse::<Statistic>().is_err());
    }
}
