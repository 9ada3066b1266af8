use std::io::Write;

use crate::error::Result;
use crate::path::FormattedPath;

use super::{points_in_degrees, InstrumentSetup, PathExporter};

const DEFAULT_PRECISION: usize = 6;

/// Two-column table of a4 and a2 in degrees.
#[derive(Debug, Clone)]
pub struct RawExporter {
    setup: InstrumentSetup,
    precision: usize,
}

impl RawExporter {
    #[must_use]
    pub fn new(setup: InstrumentSetup) -> Self {
        Self {
            setup,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Number of decimals written per angle.
    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }
}

impl PathExporter for RawExporter {
    fn export(&self, path: &FormattedPath, out: &mut dyn Write) -> Result<()> {
        if let Some(k) = self.setup.k_fix {
            writeln!(out, "#")?;
            writeln!(out, "# k_fix = {k}")?;
            writeln!(out, "# k_fix_is_kf = {}", self.setup.kf_fixed)?;
            writeln!(out, "#")?;
        }
        let width = self.precision + 6;
        writeln!(out, "# {:>w$} {:>width$}", "a4 (deg)", "a2 (deg)", w = width - 2)?;
        let prec = self.precision;
        for (a4, a2) in points_in_degrees(path) {
            writeln!(out, "{a4:>width$.prec$} {a2:>width$.prec$}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Nomad drive commands, one `dr a4 .. a2 ..` line per point.
#[derive(Debug, Clone)]
pub struct NomadExporter {
    setup: InstrumentSetup,
    precision: usize,
}

impl NomadExporter {
    #[must_use]
    pub fn new(setup: InstrumentSetup) -> Self {
        Self {
            setup,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl PathExporter for NomadExporter {
    fn export(&self, path: &FormattedPath, out: &mut dyn Write) -> Result<()> {
        if let Some(k) = self.setup.k_fix {
            let name = if self.setup.kf_fixed { "kf" } else { "ki" };
            writeln!(out, "dr {name} {k}")?;
            writeln!(out)?;
        }
        let prec = self.precision;
        for (a4, a2) in points_in_degrees(path) {
            writeln!(out, "dr a4 {a4:.prec$} a2 {a2:.prec$}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// NICOS script driving `stt` and `mtt` (or `att`).
///
/// Air cushions are switched on and motor backlash correction is disabled
/// for the duration of the path; both are restored afterwards.
#[derive(Debug, Clone)]
pub struct NicosExporter {
    setup: InstrumentSetup,
    precision: usize,
}

impl NicosExporter {
    #[must_use]
    pub fn new(setup: InstrumentSetup) -> Self {
        Self {
            setup,
            precision: DEFAULT_PRECISION,
        }
    }
}

impl PathExporter for NicosExporter {
    fn export(&self, path: &FormattedPath, out: &mut dyn Write) -> Result<()> {
        let setup = &self.setup;
        let (air, motor, sense) = if setup.kf_fixed {
            ("air_mono", "mtt", setup.senses[0])
        } else {
            ("air_ana", "att", setup.senses[2])
        };

        if let Some(k) = setup.k_fix {
            let name = if setup.kf_fixed { "kf" } else { "ki" };
            writeln!(out, "{name}({k})")?;
        }

        writeln!(out, "\n# turn on air for entire path")?;
        writeln!(out, "move(\"air_sample\", 1)")?;
        writeln!(out, "move(\"{air}\", 1)")?;

        writeln!(out, "\n# disable motor backlash correction")?;
        for m in ["stt", motor] {
            writeln!(out, "{m}_maxtries = {m}.maxtries")?;
            writeln!(out, "{m}.maxtries = 0")?;
        }

        writeln!(out, "\n# path vertices")?;
        let prec = self.precision;
        for (a4, a2) in points_in_degrees(path) {
            let stt = a4 * setup.senses[1];
            let other = a2 * sense;
            writeln!(out, "maw(stt, {stt:.prec$}, {motor}, {other:.prec$})")?;
        }

        writeln!(out, "\n# turn off air")?;
        writeln!(out, "move(\"air_sample\", 0)")?;
        writeln!(out, "move(\"{air}\", 0)")?;

        writeln!(out, "\n# restore motor backlash correction")?;
        for m in ["stt", motor] {
            writeln!(out, "{m}.maxtries = {m}_maxtries")?;
        }
        out.flush()?;
        Ok(())
    }
}
