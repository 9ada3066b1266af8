use super::{AngleConfiguration, Kinematics};

/// Triple-axis kinematics for planning in the (a4, a2) plane.
///
/// The first grid axis is the sample scattering angle a4. The second is the
/// monochromator scattering angle a2 when kf is fixed, otherwise the analyser
/// scattering angle a6; the remaining scattering angle stays at
/// `fixed_angle`. Crystal angles are half the scattering angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TasKinematics {
    /// Counter-clockwise scattering senses of monochromator, sample, analyser
    /// (`1.0` or `-1.0`).
    pub senses_ccw: [f64; 3],
    pub kf_fixed: bool,
    pub fixed_angle: f64,
}

impl TasKinematics {
    #[must_use]
    pub fn new(senses_ccw: [f64; 3], kf_fixed: bool, fixed_angle: f64) -> Self {
        Self {
            senses_ccw,
            kf_fixed,
            fixed_angle,
        }
    }
}

impl Default for TasKinematics {
    fn default() -> Self {
        Self::new([1.0, -1.0, 1.0], true, 0.0)
    }
}

impl Kinematics for TasKinematics {
    fn configuration(&self, axis1: f64, axis2: f64) -> AngleConfiguration {
        let a4 = axis1 * self.senses_ccw[1];
        let (a2, a6) = if self.kf_fixed {
            (axis2 * self.senses_ccw[0], self.fixed_angle)
        } else {
            (self.fixed_angle, axis2 * self.senses_ccw[2])
        };
        AngleConfiguration::from_scattering_angles(a2, a4, a6)
    }

    fn scattering_senses(&self) -> [f64; 3] {
        self.senses_ccw
    }

    fn kf_fixed(&self) -> bool {
        self.kf_fixed
    }
}
