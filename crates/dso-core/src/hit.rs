//! Per-hit accumulation record.
//!
//! A `HitRecord` collects everything one sensitive-detector hit produced, at
//! every processing stage the detector chose to compute:
//!
//! | Container   | Contents                                   | Default  |
//! |-------------|--------------------------------------------|----------|
//! | `raws`      | true quantities integrated over the hit    | disabled |
//! | `dgtz`      | digitized quantities derived from raws     | enabled  |
//! | `all_raws`  | true quantities for every simulation step  | disabled |
//! | `signal_vt` | treated voltage signal over time           | disabled |
//! | `quantum_s` | quantized signal per integer time bucket   | disabled |
//! | `multi_dgt` | multi-valued digitized output              | disabled |
//!
//! Each container is independently optional: an empty container means the
//! detector did not compute that stage for this hit, never that the values
//! are zero.  The record is built once per hit per event, fully populated
//! before it reaches the output layer, and discarded after the event is
//! written.
//!
//! Field names are not validated here; schema conformance is checked against
//! the [`Bank`][crate::Bank] supplied at write time.

use std::collections::BTreeMap;

/// Value returned by the `*_or_missing` lookups when a field is absent.
///
/// Prefer [`HitRecord::raw`] / [`HitRecord::dgt`], which return `Option` and
/// cannot collide with a legitimate value.  The constant survives because
/// bank composition pads absent per-hit fields with it when building
/// rectangular output blocks.
pub const MISSING_VALUE: f64 = -99.0;

/// Accumulated output information for one detector hit.
///
/// Pure data holder: setters replace a container or one named entry, getters
/// return independent copies.  No I/O, no side effects beyond its own state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitRecord {
    raws:      BTreeMap<String, f64>,
    dgtz:      BTreeMap<String, f64>,
    all_raws:  BTreeMap<String, Vec<f64>>,
    /// Time-ordered (time, voltage) samples.
    signal_vt: Vec<(f64, f64)>,
    quantum_s: BTreeMap<i32, i32>,
    multi_dgt: BTreeMap<String, Vec<i32>>,
}

impl HitRecord {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Whole-container setters ───────────────────────────────────────────

    pub fn set_raws(&mut self, raws: BTreeMap<String, f64>) {
        self.raws = raws;
    }

    pub fn set_dgtz(&mut self, dgtz: BTreeMap<String, f64>) {
        self.dgtz = dgtz;
    }

    pub fn set_all_raws(&mut self, all_raws: BTreeMap<String, Vec<f64>>) {
        self.all_raws = all_raws;
    }

    pub fn set_signal(&mut self, signal_vt: Vec<(f64, f64)>) {
        self.signal_vt = signal_vt;
    }

    pub fn set_quantum(&mut self, quantum_s: BTreeMap<i32, i32>) {
        self.quantum_s = quantum_s;
    }

    pub fn set_multi_dgt(&mut self, multi_dgt: BTreeMap<String, Vec<i32>>) {
        self.multi_dgt = multi_dgt;
    }

    // ── Single-entry setters ──────────────────────────────────────────────

    /// Set one integrated true-information value.  Integer values widen to
    /// the scalar storage.
    pub fn set_one_raw(&mut self, name: impl Into<String>, value: impl Into<f64>) {
        self.raws.insert(name.into(), value.into());
    }

    /// Set one digitized value.  Integer values widen to the scalar storage.
    pub fn set_one_dgt(&mut self, name: impl Into<String>, value: impl Into<f64>) {
        self.dgtz.insert(name.into(), value.into());
    }

    // ── Container getters (independent copies) ────────────────────────────

    pub fn raws(&self) -> BTreeMap<String, f64> {
        self.raws.clone()
    }

    pub fn dgtz(&self) -> BTreeMap<String, f64> {
        self.dgtz.clone()
    }

    pub fn all_raws(&self) -> BTreeMap<String, Vec<f64>> {
        self.all_raws.clone()
    }

    pub fn signal_vt(&self) -> Vec<(f64, f64)> {
        self.signal_vt.clone()
    }

    pub fn quantum_s(&self) -> BTreeMap<i32, i32> {
        self.quantum_s.clone()
    }

    pub fn multi_dgt(&self) -> BTreeMap<String, Vec<i32>> {
        self.multi_dgt.clone()
    }

    // ── Named lookups ─────────────────────────────────────────────────────

    /// Look up one integrated true-information value by name.
    pub fn raw(&self, name: &str) -> Option<f64> {
        self.raws.get(name).copied()
    }

    /// Look up one digitized value by name.
    pub fn dgt(&self, name: &str) -> Option<f64> {
        self.dgtz.get(name).copied()
    }

    /// Like [`raw`][Self::raw], returning [`MISSING_VALUE`] on a miss.
    pub fn raw_or_missing(&self, name: &str) -> f64 {
        self.raw(name).unwrap_or(MISSING_VALUE)
    }

    /// Like [`dgt`][Self::dgt], returning [`MISSING_VALUE`] on a miss.
    pub fn dgt_or_missing(&self, name: &str) -> f64 {
        self.dgt(name).unwrap_or(MISSING_VALUE)
    }

    /// Per-step values for one named field, if computed.
    pub fn steps(&self, name: &str) -> Option<&[f64]> {
        self.all_raws.get(name).map(Vec::as_slice)
    }

    /// True if the detector computed integrated raw output for this hit.
    pub fn has_raws(&self) -> bool {
        !self.raws.is_empty()
    }

    /// True if the detector computed per-step raw output for this hit.
    pub fn has_all_raws(&self) -> bool {
        !self.all_raws.is_empty()
    }
}
