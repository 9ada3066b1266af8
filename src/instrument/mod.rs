//! Instrument description consumed by the configuration-space builder.
//!
//! The engine only needs two narrow seams: a [`Kinematics`] that turns one
//! pair of grid angles into a full [`AngleConfiguration`], and a
//! [`CollisionModel`] that classifies such a configuration. [`InstrumentSpace`]
//! is the 2D instrument model shipped with the crate; any other model can be
//! plugged in through the traits.

mod axis;
mod collide;
mod kinematics;
mod space;

pub use axis::{AngleLimits, Axis, AxisFrame, Component, Shape};
pub use collide::{circle_polygon_overlap, circles_overlap, polygons_overlap};
pub use kinematics::TasKinematics;
pub use space::InstrumentSpace;

/// Angles of all six spectrometer axes, in radians.
///
/// `a1`/`a2` are the monochromator crystal and scattering angles, `a3`/`a4`
/// the sample rotation and scattering angles, `a5`/`a6` the analyser crystal
/// and scattering angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleConfiguration {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub a4: f64,
    pub a5: f64,
    pub a6: f64,
}

impl AngleConfiguration {
    /// Builds a configuration from the three scattering angles, deriving the
    /// crystal angles as half of them.
    #[must_use]
    pub fn from_scattering_angles(a2: f64, a4: f64, a6: f64) -> Self {
        Self {
            a1: 0.5 * a2,
            a2,
            a3: 0.5 * a4,
            a4,
            a5: 0.5 * a6,
            a6,
        }
    }

    /// The angles in axis order `a1..a6`.
    #[must_use]
    pub fn as_array(&self) -> [f64; 6] {
        [self.a1, self.a2, self.a3, self.a4, self.a5, self.a6]
    }
}

/// Geometry collaborator: decides whether a pose is allowed and collision-free.
pub trait CollisionModel: Send + Sync {
    /// Returns `false` if any axis angle lies outside its permitted range.
    fn within_limits(&self, config: &AngleConfiguration) -> bool;

    /// Returns `true` if any two instrument parts, or a part and a wall, overlap.
    fn collides(&self, config: &AngleConfiguration) -> bool;

    /// Angular speeds of the two planned axes, if known.
    fn axis_speeds(&self, _kf_fixed: bool) -> Option<[f64; 2]> {
        None
    }
}

/// Kinematics collaborator: expands one grid point into a full pose.
pub trait Kinematics: Send + Sync {
    /// Maps the grid angles (first axis, second axis) to a configuration.
    fn configuration(&self, axis1: f64, axis2: f64) -> AngleConfiguration;

    /// Counter-clockwise scattering senses of monochromator, sample and analyser.
    fn scattering_senses(&self) -> [f64; 3] {
        [1.0; 3]
    }

    /// Whether the final wave vector is fixed, so that the second grid axis
    /// moves the monochromator rather than the analyser.
    fn kf_fixed(&self) -> bool {
        true
    }
}
