//! Bank-guided composition of records into [`BankBlock`]s.
//!
//! The rules every backend inherits:
//!
//! - A data field name with no entry in the supplied bank is a
//!   [`SchemaMismatch`][crate::OutputError::SchemaMismatch]; nothing is ever
//!   silently dropped.
//! - Output field order is the bank's schema order, restricted to fields
//!   actually present in the data (absence means "not computed", not zero).
//! - Hit blocks are rectangular: a hit missing one of the listed fields pads
//!   with [`MISSING_VALUE`] (scalar categories) or an empty sequence
//!   (per-step category).
//! - A bank field of kind `Int` renders as an integer value.

use std::collections::{BTreeMap, BTreeSet};

use dso_core::{Bank, BankField, BankMap, FieldKind, GeneratedParticle, HitRecord, MISSING_VALUE};

use crate::block::{BankBlock, BankValue};
use crate::error::{OutputError, OutputResult};

/// Scalar per-hit categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScalarCategory {
    /// Integrated true information (`raws`).
    RawIntegrated,
    /// Digitized information (`dgtz`).
    Digitized,
}

impl ScalarCategory {
    /// Suffix used in block names, e.g. `ecal.dgtz`.
    pub fn label(self) -> &'static str {
        match self {
            ScalarCategory::RawIntegrated => "raws",
            ScalarCategory::Digitized     => "dgtz",
        }
    }

    fn container(self, hit: &HitRecord) -> BTreeMap<String, f64> {
        match self {
            ScalarCategory::RawIntegrated => hit.raws(),
            ScalarCategory::Digitized     => hit.dgtz(),
        }
    }
}

/// Fixed schema of the per-particle detector summaries.
pub const SUMMARY_FIELDS: [&str; 6] = ["pindex", "detector", "hits", "etot", "t", "nphe"];

/// Block name of the per-particle detector summaries.
pub const SUMMARY_BANK: &str = "psummary";

// ── Bank resolution ───────────────────────────────────────────────────────────

/// Resolve the bank registered for `category`, failing descriptibly.
pub fn bank_for<'a>(banks: &'a BankMap, category: &str) -> OutputResult<&'a Bank> {
    banks
        .get(category)
        .ok_or_else(|| OutputError::MissingBank(category.to_owned()))
}

fn render(kind: FieldKind, value: f64) -> BankValue {
    match kind {
        FieldKind::Double => BankValue::Double(value),
        FieldKind::Int    => BankValue::Int(value as i64),
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

/// Compose the event-header block: one row, fields in bank order.
pub fn header_block(header: &BTreeMap<String, f64>, bank: &Bank) -> OutputResult<BankBlock> {
    for name in header.keys() {
        if !bank.contains(name) {
            return Err(OutputError::SchemaMismatch {
                bank:  bank.name().to_owned(),
                field: name.clone(),
            });
        }
    }

    let mut fields = Vec::new();
    let mut row = Vec::new();
    for f in bank.fields() {
        if let Some(&v) = header.get(&f.name) {
            fields.push(f.name.clone());
            row.push(render(f.kind, v));
        }
    }

    Ok(BankBlock { name: bank.name().to_owned(), fields, rows: vec![row] })
}

// ── Generated particles ───────────────────────────────────────────────────────

/// Compose the generated-particle kinematics block: one row per particle,
/// every bank field resolved through the particle's named-variable lookup.
pub fn generated_block(particles: &[GeneratedParticle], bank: &Bank) -> OutputResult<BankBlock> {
    let fields: Vec<String> = bank.fields().iter().map(|f| f.name.clone()).collect();

    let mut rows = Vec::with_capacity(particles.len());
    for particle in particles {
        let mut row = Vec::with_capacity(fields.len());
        for f in bank.fields() {
            let value = match f.kind {
                FieldKind::Int    => particle.int_variable(&f.name).map(BankValue::Int),
                FieldKind::Double => particle.float_variable(&f.name).map(BankValue::Double),
            };
            // An unresolvable variable name is a schema defect in the bank.
            let value = value.map_err(|_| OutputError::SchemaMismatch {
                bank:  bank.name().to_owned(),
                field: f.name.clone(),
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    Ok(BankBlock { name: bank.name().to_owned(), fields, rows })
}

/// Compose the detector-summary block: one row per (particle, summary),
/// `pindex` is the 1-based particle index.
pub fn summary_block(particles: &[GeneratedParticle]) -> BankBlock {
    let mut rows = Vec::new();
    for (i, particle) in particles.iter().enumerate() {
        for summary in particle.summaries() {
            rows.push(vec![
                BankValue::Int(i as i64 + 1),
                BankValue::Text(summary.detector().to_owned()),
                BankValue::Int(summary.hit_count() as i64),
                BankValue::Double(summary.total_energy()),
                BankValue::Double(summary.earliest_time()),
                BankValue::Int(summary.photoelectrons() as i64),
            ]);
        }
    }

    BankBlock {
        name:   SUMMARY_BANK.to_owned(),
        fields: SUMMARY_FIELDS.iter().map(|s| (*s).to_owned()).collect(),
        rows,
    }
}

// ── Hits ──────────────────────────────────────────────────────────────────────

/// Field list for a hit block: bank order restricted to names present in at
/// least one container, after validating every name against the bank.
fn hit_fields<'a>(
    bank:       &'a Bank,
    containers: impl Iterator<Item = BTreeSet<String>>,
) -> OutputResult<Vec<&'a BankField>> {
    let mut present = BTreeSet::new();
    for keys in containers {
        for name in keys {
            if !bank.contains(&name) {
                return Err(OutputError::SchemaMismatch {
                    bank:  bank.name().to_owned(),
                    field: name,
                });
            }
            present.insert(name);
        }
    }

    Ok(bank
        .fields()
        .iter()
        .filter(|f| present.contains(&f.name))
        .collect())
}

/// Compose a scalar hit block (`raws` or `dgtz`) for one detector: one row
/// per hit, padded with [`MISSING_VALUE`] where a hit omitted a field.
pub fn scalar_hits_block(
    hits:     &[HitRecord],
    detector: &str,
    bank:     &Bank,
    category: ScalarCategory,
) -> OutputResult<BankBlock> {
    let containers: Vec<BTreeMap<String, f64>> =
        hits.iter().map(|h| category.container(h)).collect();

    let fields = hit_fields(
        bank,
        containers.iter().map(|c| c.keys().cloned().collect()),
    )?;

    let rows = containers
        .iter()
        .map(|container| {
            fields
                .iter()
                .map(|f| {
                    render(f.kind, container.get(&f.name).copied().unwrap_or(MISSING_VALUE))
                })
                .collect()
        })
        .collect();

    Ok(BankBlock {
        name:   format!("{detector}.{}", category.label()),
        fields: fields.into_iter().map(|f| f.name.clone()).collect(),
        rows,
    })
}

/// Compose the per-step hit block (`all_raws`) for one detector: one row per
/// hit, each value the field's step sequence (empty where a hit omitted it).
pub fn step_hits_block(
    hits:     &[HitRecord],
    detector: &str,
    bank:     &Bank,
) -> OutputResult<BankBlock> {
    let containers: Vec<BTreeMap<String, Vec<f64>>> =
        hits.iter().map(|h| h.all_raws()).collect();

    let fields = hit_fields(
        bank,
        containers.iter().map(|c| c.keys().cloned().collect()),
    )?;

    let rows = containers
        .iter()
        .map(|container| {
            fields
                .iter()
                .map(|f| {
                    BankValue::DoubleSeq(container.get(&f.name).cloned().unwrap_or_default())
                })
                .collect()
        })
        .collect();

    Ok(BankBlock {
        name:   format!("{detector}.steps"),
        fields: fields.into_iter().map(|f| f.name.clone()).collect(),
        rows,
    })
}
