//! Loading converter output tables into an analysis sample.
//!
//! The converter persists one geometry table and one hit-rate table per
//! element type. A fit sample needs both joined per observation: the hit row
//! carries time and charge, the element's geometry record everything else.
//! The join key is the element id.

use log::info;
use thiserror::Error;

use converter::convert::OutputTables;
use converter::geometry::PmtType;
use converter::transform::PmtGeomRecord;

use crate::binning::BinManager;
use crate::event::FitEvent;
use crate::sample::Sample;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("hit row references PMT {id} but the geometry table has {n_pmts} entries")]
    UnknownPmt { id: usize, n_pmts: usize },
}

fn apply_geometry(event: &mut FitEvent, record: &PmtGeomRecord, source_z: f64) {
    event.pmt_id = record.pmt_id;
    event.module_pmt_id = record.module_pmt_id;
    event.distance = record.distance;
    event.incidence_cos = record.incidence_cos;
    event.source_cos = record.source_cos;
    event.source_phi = record.source_phi;
    event.module_cos = record.module_cos;
    event.module_phi = record.module_phi;
    event.solid_angle = record.solid_angle;
    event.z_offset = record.z_offset;
    event.source_z = source_z;
}

/// Build a sample of one element type from the converter's table store.
///
/// Each hit row is joined with its element's geometry record into one event;
/// the geometry table itself becomes the sample's per-element entries, which
/// carry the same observables as the events minus time and charge. `source_z`
/// is the injection point's z, which the tables do not record.
pub fn sample_from_tables(
    id: usize,
    name: &str,
    tables: &OutputTables,
    pmt_type: PmtType,
    binning: BinManager,
    source_z: f64,
) -> Result<Sample, LoaderError> {
    let geom = tables.pmt_geom(pmt_type);
    let mut sample = Sample::new(id, name, binning, pmt_type.index());

    for (i, row) in tables.hit_rate(pmt_type).iter().enumerate() {
        let record = geom.get(row.pmt_id).ok_or(LoaderError::UnknownPmt {
            id: row.pmt_id,
            n_pmts: geom.len(),
        })?;
        let mut event = FitEvent::new(i);
        apply_geometry(&mut event, record, source_z);
        event.time_tof = row.time_tof;
        event.n_pe = row.n_pe;
        event.set_weight_mc(row.weight);
        sample.add_event(event);
    }

    for (i, record) in geom.iter().enumerate() {
        let mut entry = FitEvent::new(i);
        apply_geometry(&mut entry, record, source_z);
        entry.set_weight_mc(record.weight);
        sample.add_pmt(entry);
    }

    info!(
        "loaded sample {} ({}): {} events, {} PMTs",
        id,
        name,
        sample.n_events(),
        sample.n_pmts()
    );
    Ok(sample)
}
