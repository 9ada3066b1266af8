//! Writers for the line-segment mesh and for found paths.
//!
//! Everything writes to a caller-supplied [`std::io::Write`]; opening files
//! is left to the caller.

mod commands;
mod lines;

pub use commands::{NicosExporter, NomadExporter, RawExporter};
pub use lines::write_lines2d;

use std::io::Write;

use crate::error::Result;
use crate::instrument::Kinematics;
use crate::path::FormattedPath;

/// Instrument settings echoed into command scripts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentSetup {
    /// Fixed wave number, if known.
    pub k_fix: Option<f64>,
    /// `true` when kf is fixed, so the second axis is the monochromator.
    pub kf_fixed: bool,
    /// Counter-clockwise senses of monochromator, sample and analyser.
    pub senses: [f64; 3],
}

impl Default for InstrumentSetup {
    fn default() -> Self {
        Self {
            k_fix: None,
            kf_fixed: true,
            senses: [1.0; 3],
        }
    }
}

impl InstrumentSetup {
    /// Takes scattering senses and the fixed wave vector from `kinematics`.
    #[must_use]
    pub fn from_kinematics(kinematics: &dyn Kinematics) -> Self {
        Self {
            k_fix: None,
            kf_fixed: kinematics.kf_fixed(),
            senses: kinematics.scattering_senses(),
        }
    }

    #[must_use]
    pub fn with_k_fix(mut self, k: f64) -> Self {
        self.k_fix = Some(k);
        self
    }
}

/// Writes a formatted path in some control-system dialect.
///
/// The first coordinate of each point is a4, the second a2 (or a6 when ki
/// is fixed); exporters always write degrees.
pub trait PathExporter {
    /// # Errors
    ///
    /// Returns `PathsError::Io` if writing fails.
    fn export(&self, path: &FormattedPath, out: &mut dyn Write) -> Result<()>;
}

/// Path points converted to degrees.
fn points_in_degrees(path: &FormattedPath) -> impl Iterator<Item = (f64, f64)> + '_ {
    path.points
        .iter()
        .map(|[a4, a2]| (path.units.degrees_of(*a4), path.units.degrees_of(*a2)))
}
