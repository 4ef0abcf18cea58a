//! Output configuration.
//!
//! Typically deserialized from a TOML/JSON run card by the application crate
//! and passed to [`OutputChannel::open`][crate::OutputChannel::open] and the
//! backend registry.  The per-detector flags are consumed by the
//! simulation-side caller to decide which write operations to invoke; the
//! backends themselves write whatever they are handed.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which output categories are produced for one detector.
///
/// Per-step raw output is by far the most verbose and both true-information
/// categories are off unless a detector opts in; digitized output is on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DetectorFlags {
    /// Integrated true-information output (`raws`).
    pub raw:       bool,
    /// Step-by-step true-information output (`all_raws`).
    pub steps:     bool,
    /// Digitized output (`dgtz`).
    pub digitized: bool,
}

impl Default for DetectorFlags {
    fn default() -> Self {
        Self { raw: false, steps: false, digitized: true }
    }
}

/// Top-level output configuration for one run.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OutputConfig {
    /// Backend identifier, e.g. `"structured"` or `"text"`.
    pub kind: String,

    /// Destination file path.
    pub path: PathBuf,

    /// Per-detector category flags.  Detectors absent from the map get
    /// [`DetectorFlags::default`].
    #[serde(default)]
    pub detectors: BTreeMap<String, DetectorFlags>,
}

impl OutputConfig {
    pub fn new(kind: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind:      kind.into(),
            path:      path.into(),
            detectors: BTreeMap::new(),
        }
    }

    /// Category flags for `detector` (defaults if unconfigured).
    pub fn flags(&self, detector: &str) -> DetectorFlags {
        self.detectors.get(detector).copied().unwrap_or_default()
    }
}
