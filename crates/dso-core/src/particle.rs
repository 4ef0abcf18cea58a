//! Generated-particle records and their per-detector summaries.
//!
//! A [`GeneratedParticle`] exists for every primary particle of an event
//! (and for secondaries when the simulation side tracks them).  Each one
//! exclusively owns the [`ParticleSummary`] rollups for the detectors it
//! fired; summaries are created lazily on the first hit and accumulated
//! through [`GeneratedParticle::record_hit`] for the rest of the event.
//! The whole hierarchy lives for one event only.

use crate::error::{DsoError, DsoResult};
use crate::vec3::Vec3;

// ── ParticleSummary ───────────────────────────────────────────────────────────

/// Rollup of what one particle (and its descendants) caused in one detector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticleSummary {
    detector:       String,
    hit_count:      u32,
    total_energy:   f64,
    /// Earliest hit time; negative until the first hit is recorded so the
    /// first real assignment is unambiguous.
    earliest_time:  f64,
    photoelectrons: u32,
}

impl ParticleSummary {
    pub fn new(detector: impl Into<String>) -> Self {
        Self {
            detector:       detector.into(),
            hit_count:      0,
            total_energy:   0.0,
            earliest_time:  -1.0,
            photoelectrons: 0,
        }
    }

    pub fn detector(&self) -> &str {
        &self.detector
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    /// Earliest recorded hit time, negative while no hit has been recorded.
    pub fn earliest_time(&self) -> f64 {
        self.earliest_time
    }

    pub fn photoelectrons(&self) -> u32 {
        self.photoelectrons
    }

    /// Fold one hit into the rollup.
    pub fn record_hit(&mut self, energy: f64, time: f64, photoelectrons: u32) {
        self.hit_count += 1;
        self.total_energy += energy;
        self.photoelectrons += photoelectrons;
        if self.earliest_time < 0.0 || time < self.earliest_time {
            self.earliest_time = time;
        }
    }
}

// ── GeneratedParticle ─────────────────────────────────────────────────────────

/// One generated (primary or tracked secondary) particle of an event.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratedParticle {
    pub vertex:       Vec3,
    pub momentum:     Vec3,
    pub pid:          i32,
    pub time:         f64,
    pub multiplicity: u32,
    summaries:        Vec<ParticleSummary>,
}

impl GeneratedParticle {
    pub fn new(pid: i32, vertex: Vec3, momentum: Vec3, time: f64, multiplicity: u32) -> Self {
        Self {
            vertex,
            momentum,
            pid,
            time,
            multiplicity,
            summaries: Vec::new(),
        }
    }

    /// Per-detector summaries, in first-hit order.
    pub fn summaries(&self) -> &[ParticleSummary] {
        &self.summaries
    }

    /// Fold one hit in `detector` into this particle's summaries, creating
    /// the detector's rollup on first contact.
    pub fn record_hit(&mut self, detector: &str, energy: f64, time: f64, photoelectrons: u32) {
        let idx = match self.summaries.iter().position(|s| s.detector() == detector) {
            Some(i) => i,
            None => {
                self.summaries.push(ParticleSummary::new(detector));
                self.summaries.len() - 1
            }
        };
        self.summaries[idx].record_hit(energy, time, photoelectrons);
    }

    // ── Named-variable lookup ─────────────────────────────────────────────
    //
    // Resolves kinematic/identity fields only; hit data stays with the
    // backends.

    /// Resolve an integer-valued variable name (`pid`, `multiplicity`).
    pub fn int_variable(&self, name: &str) -> DsoResult<i64> {
        match name {
            "pid"          => Ok(self.pid as i64),
            "multiplicity" => Ok(self.multiplicity as i64),
            _              => Err(DsoError::UnknownVariable(name.to_owned())),
        }
    }

    /// Resolve a floating-valued variable name
    /// (`px`, `py`, `pz`, `vx`, `vy`, `vz`, `time`).
    pub fn float_variable(&self, name: &str) -> DsoResult<f64> {
        match name {
            "px"   => Ok(self.momentum.x),
            "py"   => Ok(self.momentum.y),
            "pz"   => Ok(self.momentum.z),
            "vx"   => Ok(self.vertex.x),
            "vy"   => Ok(self.vertex.y),
            "vz"   => Ok(self.vertex.z),
            "time" => Ok(self.time),
            _      => Err(DsoError::UnknownVariable(name.to_owned())),
        }
    }
}
