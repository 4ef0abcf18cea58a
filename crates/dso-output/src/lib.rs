//! `dso-output` — event-output backends for the `rust_dso` detector layer.
//!
//! Two backends are provided behind one [`OutputBackend`] contract:
//!
//! | Kind           | Backend               | Output                                      |
//! |----------------|-----------------------|---------------------------------------------|
//! | `"text"`       | [`TextBackend`]       | line-oriented human-readable event blocks   |
//! | `"structured"` | [`StructuredBackend`] | bincode stream, one binary record per event |
//!
//! Both render the same logical event: records are composed into neutral
//! [`BankBlock`]s by the [`compose`] rules (bank-guided field order, schema
//! mismatch on unknown names, sentinel padding), and the backends only
//! differ in encoding.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dso_output::{OutputChannel, OutputConfig, register_backends};
//!
//! let config = OutputConfig::new("text", "run.txt");
//! let mut channel = OutputChannel::open(&config)?;
//! let mut backend = register_backends().get_backend(&config.kind)?;
//!
//! backend.record_sim_conditions(&mut channel, &conditions)?;
//! for event in events {
//!     backend.write_header(&mut channel, &event.header, &banks["header"])?;
//!     backend.write_generated(&mut channel, &event.particles, &banks)?;
//!     for (detector, hits) in &event.hits {
//!         if config.flags(detector).digitized {
//!             backend.write_dgt_integrated(&mut channel, hits, detector, &banks)?;
//!         }
//!     }
//!     backend.write_event(&mut channel)?;
//! }
//! channel.close()?;
//! ```
//!
//! All writes for one channel must come from a single writer; the backends
//! mutate per-channel stream state and provide no locking.

pub mod backend;
pub mod block;
pub mod channel;
pub mod compose;
pub mod config;
pub mod error;
pub mod registry;
pub mod stream;
pub mod text;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use backend::{OutputBackend, WriteSequence};
pub use block::{BankBlock, BankValue};
pub use channel::{OutputChannel, OutputKind};
pub use config::{DetectorFlags, OutputConfig};
pub use error::{OutputError, OutputResult};
pub use registry::{BackendCtor, BackendRegistry, register_backends};
pub use stream::{StreamRecord, StructuredBackend};
pub use text::TextBackend;
