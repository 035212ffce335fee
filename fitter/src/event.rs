//! Fit-facing observation record.
//!
//! One record per PMT observation: the source-relative geometry of the
//! element plus the observed charge and corrected time. Records are value
//! types; only the fit weight mutates across iterations, through the
//! reset-and-reapply protocol.

/// Observable fields a binning scheme or cut can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTag {
    /// Distance to the source.
    Distance,
    /// Photon incidence cosine on the element.
    IncidenceCos,
    /// Element direction cosine relative to the source axis.
    SourceCos,
    /// Element azimuth in the source-local frame.
    SourcePhi,
    /// Incidence cosine relative to the module's central element.
    ModuleCos,
    /// Arrival azimuth referenced to the module's central element.
    ModulePhi,
    /// Solid angle subtended by the element.
    SolidAngle,
    /// Element z minus source z.
    ZOffset,
    /// Absolute z of the injection source.
    SourceZ,
    /// Time-of-flight-corrected hit time.
    TimeTof,
    /// Observed photoelectron count.
    NPe,
    /// Unique element id.
    PmtId,
    /// Sub-index within the module.
    ModulePmtId,
    /// Relative detection efficiency of the element.
    Efficiency,
}

/// One PMT observation.
#[derive(Debug, Clone)]
pub struct FitEvent {
    pub id: usize,
    pub pmt_id: usize,
    pub module_pmt_id: usize,
    pub distance: f64,
    pub incidence_cos: f64,
    pub source_cos: f64,
    pub source_phi: f64,
    pub module_cos: f64,
    pub module_phi: f64,
    pub solid_angle: f64,
    pub z_offset: f64,
    pub source_z: f64,
    pub time_tof: f64,
    pub n_pe: f64,
    pub efficiency: f64,
    weight: f64,
    weight_mc: f64,
    bin: Option<usize>,
}

impl FitEvent {
    /// A record with unit weights and zeroed observables; callers fill the
    /// fields they have.
    pub fn new(id: usize) -> FitEvent {
        FitEvent {
            id,
            pmt_id: 0,
            module_pmt_id: 0,
            distance: 0.0,
            incidence_cos: 0.0,
            source_cos: 0.0,
            source_phi: 0.0,
            module_cos: 0.0,
            module_phi: 0.0,
            solid_angle: 0.0,
            z_offset: 0.0,
            source_z: 0.0,
            time_tof: 0.0,
            n_pe: 0.0,
            efficiency: 1.0,
            weight: 1.0,
            weight_mc: 1.0,
            bin: None,
        }
    }

    /// Value of the selected field.
    pub fn field(&self, tag: FieldTag) -> f64 {
        match tag {
            FieldTag::Distance => self.distance,
            FieldTag::IncidenceCos => self.incidence_cos,
            FieldTag::SourceCos => self.source_cos,
            FieldTag::SourcePhi => self.source_phi,
            FieldTag::ModuleCos => self.module_cos,
            FieldTag::ModulePhi => self.module_phi,
            FieldTag::SolidAngle => self.solid_angle,
            FieldTag::ZOffset => self.z_offset,
            FieldTag::SourceZ => self.source_z,
            FieldTag::TimeTof => self.time_tof,
            FieldTag::NPe => self.n_pe,
            FieldTag::PmtId => self.pmt_id as f64,
            FieldTag::ModulePmtId => self.module_pmt_id as f64,
            FieldTag::Efficiency => self.efficiency,
        }
    }

    /// Current fit weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Weight the event carried in the original MC.
    pub fn weight_mc(&self) -> f64 {
        self.weight_mc
    }

    /// Set both the fit weight and the MC weight it resets to.
    pub fn set_weight_mc(&mut self, weight: f64) {
        self.weight = weight;
        self.weight_mc = weight;
    }

    /// Multiply the fit weight by an iteration-specific correction.
    pub fn scale_weight(&mut self, factor: f64) {
        self.weight *= factor;
    }

    /// Restore the fit weight to the original MC weight.
    pub fn reset_weight(&mut self) {
        self.weight = self.weight_mc;
    }

    /// Bin assigned by the last histogram fill, if the event was in range.
    pub fn bin(&self) -> Option<usize> {
        self.bin
    }

    pub(crate) fn set_bin(&mut self, bin: Option<usize>) {
        self.bin = bin;
    }
}
