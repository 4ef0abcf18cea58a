//! Plain-text output backend.
//!
//! Line-oriented, human-readable records: a `run conditions:` block at the
//! top of the stream, then one `event N:` … `end event N` block per event
//! with the composed bank blocks nested inside.  Field values print in write
//! order; the format is for eyes and greps, not for binary round-trips.

use std::collections::BTreeMap;
use std::io::Write;

use dso_core::{Bank, BankMap, GeneratedParticle, HitRecord};

use crate::backend::{OutputBackend, WriteSequence};
use crate::block::BankBlock;
use crate::channel::OutputChannel;
use crate::compose;
use crate::error::OutputResult;

/// Writes events as indented text blocks.
#[derive(Debug, Default)]
pub struct TextBackend {
    seq: WriteSequence,
}

impl TextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_block(channel: &mut OutputChannel, block: &BankBlock) -> OutputResult<()> {
        if block.is_empty() {
            return Ok(());
        }
        let w = channel.text()?;
        writeln!(w, "  {}:", block.name)?;
        for (i, row) in block.rows.iter().enumerate() {
            write!(w, "    [{}]", i + 1)?;
            for (field, value) in block.fields.iter().zip(row) {
                write!(w, " {field}: {value}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

impl OutputBackend for TextBackend {
    fn kind(&self) -> &'static str {
        "text"
    }

    /// Precondition: call before the first event.  The text stream has no
    /// framing to enforce it, so a late call simply appends its block
    /// wherever the stream is.
    fn record_sim_conditions(
        &mut self,
        channel:    &mut OutputChannel,
        conditions: &BTreeMap<String, String>,
    ) -> OutputResult<()> {
        let w = channel.text()?;
        writeln!(w, "run conditions:")?;
        for (name, value) in conditions {
            writeln!(w, "  {name}: {value}")?;
        }
        Ok(())
    }

    fn write_header(
        &mut self,
        channel: &mut OutputChannel,
        header:  &BTreeMap<String, f64>,
        bank:    &Bank,
    ) -> OutputResult<()> {
        self.seq.begin_event()?;
        let block = compose::header_block(header, bank)?;
        writeln!(channel.text()?, "event {}:", self.seq.events_written() + 1)?;
        Self::write_block(channel, &block)
    }

    fn write_generated(
        &mut self,
        channel:   &mut OutputChannel,
        particles: &[GeneratedParticle],
        banks:     &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_generated")?;
        let bank = compose::bank_for(banks, "generated")?;
        Self::write_block(channel, &compose::generated_block(particles, bank)?)?;
        Self::write_block(channel, &compose::summary_block(particles))
    }

    fn write_raw_integrated(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_raw_integrated")?;
        let bank = compose::bank_for(banks, detector)?;
        let block =
            compose::scalar_hits_block(hits, detector, bank, compose::ScalarCategory::RawIntegrated)?;
        Self::write_block(channel, &block)
    }

    fn write_raw_steps(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_raw_steps")?;
        let bank = compose::bank_for(banks, detector)?;
        Self::write_block(channel, &compose::step_hits_block(hits, detector, bank)?)
    }

    fn write_dgt_integrated(
        &mut self,
        channel:  &mut OutputChannel,
        hits:     &[HitRecord],
        detector: &str,
        banks:    &BankMap,
    ) -> OutputResult<()> {
        self.seq.require_open("write_dgt_integrated")?;
        let bank = compose::bank_for(banks, detector)?;
        let block =
            compose::scalar_hits_block(hits, detector, bank, compose::ScalarCategory::Digitized)?;
        Self::write_block(channel, &block)
    }

    fn write_event(&mut self, channel: &mut OutputChannel) -> OutputResult<()> {
        self.seq.commit_event()?;
        let w = channel.text()?;
        writeln!(w, "end event {}", self.seq.events_written())?;
        w.flush()?;
        Ok(())
    }
}
