//! `dso-core` — record types for the `rust_dso` detector output layer.
//!
//! This crate holds the pure data side of event output: what a detector hit
//! accumulated, what a generated particle looked like, and the bank schemas
//! that describe field layout per record category.  It performs no I/O; the
//! backends in `dso-output` consume these types.
//!
//! # What lives here
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`vec3`]     | `Vec3` — vertex/momentum three-vector                 |
//! | [`hit`]      | `HitRecord` — per-hit accumulation containers         |
//! | [`particle`] | `GeneratedParticle`, `ParticleSummary`                |
//! | [`bank`]     | `Bank`, `BankField`, `FieldKind`, `BankMap`           |
//! | [`error`]    | `DsoError`, `DsoResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod bank;
pub mod error;
pub mod hit;
pub mod particle;
pub mod vec3;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use bank::{Bank, BankField, BankMap, FieldKind};
pub use error::{DsoError, DsoResult};
pub use hit::{HitRecord, MISSING_VALUE};
pub use particle::{GeneratedParticle, ParticleSummary};
pub use vec3::Vec3;
