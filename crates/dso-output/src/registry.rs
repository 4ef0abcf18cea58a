//! Backend registry: output-kind identifier → backend constructor.
//!
//! Built once at process start by [`register_backends`] and read-only
//! afterwards.  Construction happens once per run: one backend instance
//! bound to one [`OutputChannel`][crate::OutputChannel] for that run's
//! lifetime.

use std::collections::BTreeMap;

use crate::backend::OutputBackend;
use crate::error::{OutputError, OutputResult};
use crate::stream::StructuredBackend;
use crate::text::TextBackend;

/// Zero-argument constructor for one backend kind.
pub type BackendCtor = fn() -> Box<dyn OutputBackend>;

/// Read-only mapping from kind identifier to backend constructor.
pub struct BackendRegistry {
    ctors: BTreeMap<&'static str, BackendCtor>,
}

impl BackendRegistry {
    /// Construct a fresh backend for `kind`.
    ///
    /// Never silently returns nothing: an absent kind is a descriptible
    /// [`UnknownKind`][OutputError::UnknownKind] error listing what is
    /// registered.
    pub fn get_backend(&self, kind: &str) -> OutputResult<Box<dyn OutputBackend>> {
        let ctor = self.ctors.get(kind).ok_or_else(|| OutputError::UnknownKind {
            requested: kind.to_owned(),
            known:     self.kinds().join(", "),
        })?;
        tracing::trace!(kind, "backend constructed");
        Ok(ctor())
    }

    /// Registered kind identifiers, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.ctors.keys().copied().collect()
    }
}

/// Build the registry of all shipped backends.
pub fn register_backends() -> BackendRegistry {
    let mut ctors: BTreeMap<&'static str, BackendCtor> = BTreeMap::new();
    ctors.insert("structured", || Box::new(StructuredBackend::new()));
    ctors.insert("text", || Box::new(TextBackend::new()));
    BackendRegistry { ctors }
}
