//! Bank schemas: named field layouts per record category.
//!
//! A [`Bank`] describes which fields a record category contains, in what
//! order, and with which storage kind.  Banks come from detector
//! configuration; the output layer consumes them read-only at write time and
//! never retains them past a call.
//!
//! Categories are keyed by name in a [`BankMap`]: `"header"` for the event
//! header, `"generated"` for particle kinematics, and one bank per detector
//! name covering every field that detector may emit in any category.

use std::collections::BTreeMap;

/// Storage kind of one bank field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    Double,
    Int,
}

/// One named field of a bank.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BankField {
    pub name: String,
    /// Field id inside the bank, assigned in push order starting at 1.
    pub id:   u32,
    pub kind: FieldKind,
}

/// An ordered field schema for one record category.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bank {
    name:   String,
    fields: Vec<BankField>,
}

impl Bank {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    /// Append a field, assigning the next id.  Builder-style.
    pub fn with(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let id = self.fields.len() as u32 + 1;
        self.fields.push(BankField { name: name.into(), id, kind });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in schema order.
    pub fn fields(&self) -> &[BankField] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&BankField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Bank schemas keyed by record category.
pub type BankMap = BTreeMap<String, Bank>;
