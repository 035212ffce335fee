//! Per-sample event container and histogram filler.
//!
//! An analysis sample owns the converted observations of one element type,
//! the matching per-element geometry entries, a binning scheme and the
//! prediction/data histograms the fit statistic compares. The container is
//! built once; across fit iterations only the event weights and the
//! histograms change.

use log::info;
use rand::RngCore;
use rand_distr::{Distribution, Poisson};

use crate::binning::BinManager;
use crate::event::{FieldTag, FitEvent};
use crate::stats::{StatError, Statistic};

/// One selection window on an observable: events outside `[low, high)` are
/// excluded from the histograms.
#[derive(Debug, Clone, Copy)]
struct Cut {
    field: FieldTag,
    low: f64,
    high: f64,
}

/// One analysis sample: events, geometry entries and binned histograms.
pub struct Sample {
    id: usize,
    name: String,
    pmt_type: usize,
    norm: f64,
    statistic: Statistic,
    binning: BinManager,
    cuts: Vec<Cut>,
    pmt_mask: Option<usize>,
    module_position_mask: Vec<usize>,
    events: Vec<FitEvent>,
    pmts: Vec<FitEvent>,
    pred: Vec<f64>,
    data: Vec<f64>,
}

impl Sample {
    pub fn new(id: usize, name: impl Into<String>, binning: BinManager, pmt_type: usize) -> Sample {
        let n_bins = binning.n_bins();
        Sample {
            id,
            name: name.into(),
            pmt_type,
            norm: 1.0,
            statistic: Statistic::default(),
            binning,
            cuts: Vec::new(),
            pmt_mask: None,
            module_position_mask: Vec::new(),
            events: Vec::new(),
            pmts: Vec::new(),
            pred: vec![0.0; n_bins],
            data: vec![0.0; n_bins],
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pmt_type(&self) -> usize {
        self.pmt_type
    }

    pub fn add_event(&mut self, event: FitEvent) {
        self.events.push(event);
    }

    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    pub fn event(&self, i: usize) -> Option<&FitEvent> {
        self.events.get(i)
    }

    /// Geometry entries carry the same observables as hits, minus time and
    /// charge; kept alongside the events for efficiency-style corrections.
    pub fn add_pmt(&mut self, entry: FitEvent) {
        self.pmts.push(entry);
    }

    pub fn n_pmts(&self) -> usize {
        self.pmts.len()
    }

    pub fn pmt(&self, i: usize) -> Option<&FitEvent> {
        self.pmts.get(i)
    }

    pub fn set_norm(&mut self, norm: f64) {
        self.norm = norm;
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn set_statistic(&mut self, statistic: Statistic) {
        self.statistic = statistic;
    }

    /// Select the fit statistic by name ("llh" or "chi2").
    pub fn set_statistic_by_name(&mut self, name: &str) -> Result<(), StatError> {
        self.statistic = name.parse()?;
        Ok(())
    }

    /// Add a selection window: events with `field` outside `[low, high)` are
    /// skipped by the histogram fills. Cuts accumulate; all must pass.
    pub fn set_cut(&mut self, field: FieldTag, low: f64, high: f64) {
        self.cuts.push(Cut { field, low, high });
    }

    /// Drop all selection windows.
    pub fn reset_cuts(&mut self) {
        self.cuts.clear();
    }

    /// Only use the first `n_pmt` elements; events and geometry entries with
    /// a larger element id are skipped by the histogram fills.
    pub fn mask_pmt(&mut self, n_pmt: usize) {
        self.pmt_mask = Some(n_pmt);
    }

    pub fn clear_pmt_mask(&mut self) {
        self.pmt_mask = None;
        self.module_position_mask.clear();
    }

    /// Exclude the listed in-module positions (`mPMT_id` values); events on
    /// those elements are skipped by the histogram fills.
    pub fn mask_module_positions(&mut self, positions: Vec<usize>) {
        self.module_position_mask = positions;
    }

    fn selected(
        cuts: &[Cut],
        pmt_mask: Option<usize>,
        module_position_mask: &[usize],
        event: &FitEvent,
    ) -> bool {
        if let Some(limit) = pmt_mask {
            if event.pmt_id >= limit {
                return false;
            }
        }
        if module_position_mask.contains(&event.module_pmt_id) {
            return false;
        }
        cuts.iter().all(|cut| {
            let v = event.field(cut.field);
            v >= cut.low && v < cut.high
        })
    }

    /// Restore every event weight to its original MC weight.
    pub fn reset_weights(&mut self) {
        for event in &mut self.events {
            event.reset_weight();
        }
    }

    /// Multiply every event weight by an iteration-specific correction.
    pub fn reweight_events(&mut self, factor: impl Fn(&FitEvent) -> f64) {
        for event in &mut self.events {
            let f = factor(event);
            event.scale_weight(f);
        }
    }

    /// Fill the prediction histogram from the weighted events.
    ///
    /// With `reset_weights` the per-event weights are first restored to
    /// their MC values, the protocol used when re-filling between fit
    /// iterations. Events outside the binning, failing a cut or on a masked
    /// element are skipped.
    pub fn fill_event_hist(&mut self, reset_weights: bool) {
        self.pred.iter_mut().for_each(|b| *b = 0.0);
        let cuts = &self.cuts;
        let pmt_mask = self.pmt_mask;
        let module_position_mask = &self.module_position_mask;
        for event in &mut self.events {
            if reset_weights {
                event.reset_weight();
            }
            if !Self::selected(cuts, pmt_mask, module_position_mask, event) {
                event.set_bin(None);
                continue;
            }
            let bin = self.binning.find_bin(event);
            event.set_bin(bin);
            if let Some(b) = bin {
                self.pred[b] += event.n_pe * event.weight();
            }
        }
        for b in &mut self.pred {
            *b *= self.norm;
        }
    }

    /// Fill the data histogram from the events' nominal weighted counts.
    ///
    /// With `stat_fluc` every bin is replaced by a Poisson draw around its
    /// nominal content, producing pseudo-data for closure tests.
    pub fn fill_data_hist(&mut self, stat_fluc: bool, rng: &mut dyn RngCore) {
        self.data.iter_mut().for_each(|b| *b = 0.0);
        for event in &self.events {
            if !Self::selected(&self.cuts, self.pmt_mask, &self.module_position_mask, event) {
                continue;
            }
            if let Some(b) = self.binning.find_bin(event) {
                self.data[b] += event.n_pe * event.weight_mc();
            }
        }
        for b in &mut self.data {
            *b *= self.norm;
            if stat_fluc && *b > 0.0 {
                // Poisson::new only fails for non-positive means
                if let Ok(poisson) = Poisson::new(*b) {
                    *b = poisson.sample(rng);
                }
            }
        }
    }

    pub fn pred_hist(&self) -> &[f64] {
        &self.pred
    }

    pub fn data_hist(&self) -> &[f64] {
        &self.data
    }

    /// Evaluate the selected statistic over the filled histograms.
    pub fn calc_stat(&self) -> f64 {
        self.statistic.evaluate(&self.pred, &self.data)
    }

    pub fn calc_llh(&self) -> f64 {
        Statistic::PoissonLlh.evaluate(&self.pred, &self.data)
    }

    pub fn calc_chi2(&self) -> f64 {
        Statistic::ChiSquare.evaluate(&self.pred, &self.data)
    }

    pub fn print_stats(&self) {
        info!(
            "sample {} ({}): type {}, {} events, {} PMTs, {} bins, norm {}",
            self.id,
            self.name,
            self.pmt_type,
            self.events.len(),
            self.pmts.len(),
            self.binning.n_bins(),
            self.norm
        );
    }
}
