//! Structured binary-stream backend.
//!
//! The stream is a sequence of bincode-encoded [`StreamRecord`]s: run
//! conditions once at stream start, then one `Event` record per committed
//! event carrying its [`BankBlock`]s in write order.  Blocks are buffered in
//! the backend between `write_header` and `write_event`; only the commit
//! touches the channel, so a completed stream never contains a half-written
//! event.

use std::collections::BTreeMap;

use dso_core::{Bank, BankMap, GeneratedParticle, HitRecord};

use crate::backend::{OutputBackend, WriteSequence};
use crate::block::BankBlock;
use crate::channel::OutputChannel;
use crate::compose;
use crate::error::OutputResult;

/// One framed record of the structured stream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StreamRecord {
    /// Run-level metadata, written once at stream start.
    Conditions(BTreeMap<String, String>),
    /// One committed event: its bank blocks in write order.
    Event { blocks: Vec<BankBlock> },
}

/// Writes events as one binary container each.
#[derive(Debug, Default)]
pub struct StructuredBackend {
    seq:     WriteSequence,
    pending: Vec<BankBlock>,
}

impl StructuredBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer(&mut self, block: BankBlock) {
        if !block.is_empty() {
            self.pending.push(block);
        }
    }
}

impl OutputBackend for StructuredBackend {
    fn kind(&self) -> &'static str {
        "structured"
    }

    /// Rejected once any event has been written: downstream readers assume
    /// the conditions record sits at stream start.
    fn record_sim_conditions(
        &mut self,
        channel:    &mut OutputChannel,
        conditions: &BTreeMap<String, String>,
    ) -> OutputResult<()> {
        self.seq.require_before_events("record_sim_conditions")?;
        bincode::serialize_into(
            channel.structured()?,
            &StreamRecord::Conditions(conditions.clone()),
        )?;
        Ok(())
    }

    fn write_header(
        &mut self,
        _channel: &mut OutputChannel,
        header:   &BTreeMap<String, f64>,
        bank:     &Bank,
    ) -> OutputResult<()> {
        self.seq.begin_event()?;
        let block = compose::header_block(header, bank)?;
        self.buffer(block);
        Ok(())
    }

    fn write_generated(
        &mut self,
        _channel:  &mut OutputChannel,
        particles: &[GeneratedParticle],
        banks:     &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_generated")?;
        let bank = compose::bank_for(banks, "generated")?;
        let kinematics = compose::generated_block(particles, bank)?;
        self.buffer(kinematics);
        self.buffer(compose::summary_block(particles));
        Ok(())
    }

    fn write_raw_integrated(
        &mut self,
        _channel: &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_raw_integrated")?;
        let bank = compose::bank_for(banks, detector)?;
        let block =
            compose::scalar_hits_block(hits, detector, bank, compose::ScalarCategory::RawIntegrated)?;
        self.buffer(block);
        Ok(())
    }

    fn write_raw_steps(
        &mut self,
        _channel: &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_raw_steps")?;
        let bank = compose::bank_for(banks, detector)?;
        let block = compose::step_hits_block(hits, detector, bank)?;
        self.buffer(block);
        Ok(())
    }

    fn write_dgt_integrated(
        &mut self,
        _channel: &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_dgt_integrated")?;
        let bank = compose::bank_for(banks, detector)?;
        let block =
            compose::scalar_hits_block(hits, detector, bank, compose::ScalarCategory::Digitized)?;
        self.buffer(block);
        Ok(())
    }

    /// Commits the buffered event as one record.  An event holding only its
    /// header block is valid and commits normally.
    fn write_event(&mut self, channel: &mut OutputChannel) -> OutputResult<()> {
        self.seq.commit_event()?;
        let blocks = std::mem::take(&mut self.pending);
        let n_blocks = blocks.len();
        bincode::serialize_into(channel.structured()?, &StreamRecord::Event { blocks })?;
        tracing::debug!(
            event = self.seq.events_written(),
            banks = n_blocks,
            "structured event committed"
        );
        Ok(())
    }
}
