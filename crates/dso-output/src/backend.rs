//! The `OutputBackend` trait implemented by all backends, and the shared
//! per-run write-sequence state machine.

use std::collections::BTreeMap;

use dso_core::{Bank, BankMap, GeneratedParticle, HitRecord};

use crate::channel::OutputChannel;
use crate::error::{OutputError, OutputResult};

/// Trait implemented by the text and structured backends.
///
/// One backend instance is bound to one [`OutputChannel`] for the lifetime
/// of a run, and the caller drives it through a fixed protocol:
///
/// 1. [`record_sim_conditions`][Self::record_sim_conditions] — once, before
///    any event.
/// 2. Per event: [`write_header`][Self::write_header], then
///    [`write_generated`][Self::write_generated] and any combination of the
///    hit-category writes, then [`write_event`][Self::write_event] exactly
///    once.
///
/// Out-of-order calls are rejected with a descriptible
/// [`Sequence`][OutputError::Sequence] error; in particular a second
/// `write_event` without an intervening `write_header` is an error, never a
/// silently merged or empty second event.  An event with a header and no hit
/// or particle data is valid and commits normally.
///
/// The caller decides which hit categories to write based on configuration
/// ([`DetectorFlags`][crate::DetectorFlags]); backends write whatever they
/// are handed.  Calls on one channel must all come from a single writer —
/// backends keep per-channel stream state and provide no locking.
pub trait OutputBackend: std::fmt::Debug {
    /// The kind identifier this backend was registered under.
    fn kind(&self) -> &'static str;

    /// Write run-level metadata.  Called once per run before any event;
    /// calling after events have been written is rejected by the structured
    /// backend and is a documented precondition violation for the text
    /// backend.
    fn record_sim_conditions(
        &mut self,
        channel:    &mut OutputChannel,
        conditions: &BTreeMap<String, String>,
    ) -> OutputResult<()>;

    /// Open an event and write its header fields, ordered by the header
    /// bank schema.
    fn write_header(
        &mut self,
        channel: &mut OutputChannel,
        header:  &BTreeMap<String, f64>,
        bank:    &Bank,
    ) -> OutputResult<()>;

    /// Write the event's generated particles and their detector summaries,
    /// guided by the bank registered under `"generated"`.
    fn write_generated(
        &mut self,
        channel:   &mut OutputChannel,
        particles: &[GeneratedParticle],
        banks:     &BankMap,
    ) -> OutputResult<()>;

    /// Write the integrated true-information (`raws`) container of every
    /// hit for one detector.
    fn write_raw_integrated(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()>;

    /// Write the step-by-step true-information (`all_raws`) container of
    /// every hit for one detector.
    fn write_raw_steps(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()>;

    /// Write the digitized (`dgtz`) container of every hit for one detector.
    fn write_dgt_integrated(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()>;

    /// Commit the current event.  Called exactly once per event, after all
    /// writes for that event and before the next `write_header`.
    fn write_event(&mut self, channel: &mut OutputChannel) -> OutputResult<()>;
}

// ── WriteSequence ─────────────────────────────────────────────────────────────

/// Per-run sequencing state shared by the backends: a header opens an event,
/// data writes require an open event, and a commit closes it.
#[derive(Debug, Default)]
pub struct WriteSequence {
    in_event:       bool,
    events_written: u64,
}

impl WriteSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events committed so far.
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Guard for run-level writes that must precede all events.
    pub fn require_before_events(&self, op: &str) -> OutputResult<()> {
        if self.in_event || self.events_written > 0 {
            return Err(OutputError::Sequence(format!(
                "{op} is only supported before the first event"
            )));
        }
        Ok(())
    }

    /// Open an event (the header write).
    pub fn begin_event(&mut self) -> OutputResult<()> {
        if self.in_event {
            return Err(OutputError::Sequence(
                "write_header called while an event is already open".to_owned(),
            ));
        }
        self.in_event = true;
        Ok(())
    }

    /// Guard for data writes, which need an open event.
    pub fn require_open(&self, op: &str) -> OutputResult<()> {
        if !self.in_event {
            return Err(OutputError::Sequence(format!(
                "{op} called with no open event (write_header missing)"
            )));
        }
        Ok(())
    }

    /// Commit the open event.
    pub fn commit_event(&mut self) -> OutputResult<()> {
        if !self.in_event {
            return Err(OutputError::Sequence(
                "write_event called with no open event".to_owned(),
            ));
        }
        self.in_event = false;
        self.events_written += 1;
        Ok(())
    }
}
