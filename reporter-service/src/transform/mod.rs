use homeflux_client::domain::{RawReading, Sample, SourceRef};
use time::OffsetDateTime;

use crate::{config::SourcesConfig, sources::StateStore};

/// Instantaneous power in watts, rounded half away from zero.
///
/// Sign is kept: grid power is negative while exporting.
pub fn watts(value: f64) -> i64 {
    value.round() as i64
}

/// Cumulative energy in kWh to whole Wh, rounded half away from zero.
///
/// Rules:
/// - never negative; a meter reset or noise below zero reports 0.
/// - saturates at `u64::MAX`.
pub fn kwh_to_wh(value: f64) -> u64 {
    let wh = (value * 1000.0).round();
    if wh <= 0.0 {
        0
    } else {
        wh as u64
    }
}

/// Turns the current state of the configured sources into a [`Sample`].
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    sources: SourcesConfig,
}

impl Sampler {
    pub fn new(sources: SourcesConfig) -> Self {
        Self { sources }
    }

    /// Read every slot once. Unreadable or unconfigured slots are simply left out.
    pub fn sample(&self, store: &dyn StateStore, now: OffsetDateTime) -> Sample {
        let s = &self.sources;
        let mut sample = Sample::new(now);
        sample.grid_w = read(store, s.grid_power.as_ref()).map(watts);
        sample.pv_w = read(store, s.pv_power.as_ref()).map(watts);
        sample.grid_import_wh_total = read(store, s.grid_import_total.as_ref()).map(kwh_to_wh);
        sample.grid_export_wh_total = read(store, s.grid_export_total.as_ref()).map(kwh_to_wh);
        sample.pv_wh_total = read(store, s.pv_total.as_ref()).map(kwh_to_wh);
        sample
    }
}

fn read(store: &dyn StateStore, slot: Option<&SourceRef>) -> Option<f64> {
    let Some(source) = slot else {
        return RawReading::NotConfigured.usable();
    };

    let reading = store.read(source);
    match &reading {
        RawReading::NonNumeric(text) => {
            tracing::debug!(source = %source, state = %text, "ignoring non-numeric state");
        }
        RawReading::Numeric(value) if !value.is_finite() => {
            tracing::debug!(source = %source, value, "ignoring non-finite state");
        }
        _ => {}
    }
    reading.usable()
}
