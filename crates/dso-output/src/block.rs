//! Neutral event-block model shared by all backends.
//!
//! Backends never look at `HitRecord` or `GeneratedParticle` internals
//! directly; [`compose`][crate::compose] turns them into [`BankBlock`]s and
//! every backend renders those.  Two backends handed the same records
//! therefore always write the same logical event, differing only in
//! encoding.

/// One value in a bank block.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BankValue {
    Double(f64),
    Int(i64),
    Text(String),
    /// Per-step values of one field for one hit.
    DoubleSeq(Vec<f64>),
    IntSeq(Vec<i64>),
}

impl std::fmt::Display for BankValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BankValue::Double(v) => write!(f, "{v}"),
            BankValue::Int(v)    => write!(f, "{v}"),
            BankValue::Text(s)   => f.write_str(s),
            BankValue::DoubleSeq(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            BankValue::IntSeq(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// One named, rectangular block of an event: a bank name, the ordered field
/// list, and one row of values per record (hit, particle, summary, …).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BankBlock {
    pub name:   String,
    pub fields: Vec<String>,
    /// `rows[i].len() == fields.len()` for every row.
    pub rows:   Vec<Vec<BankValue>>,
}

impl BankBlock {
    /// True when there is nothing to write (no fields or no rows).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() || self.rows.is_empty()
    }
}
