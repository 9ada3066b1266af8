use crate::math::{Isometry2, Point2, Vector2};
use crate::spatial::Aabb;

/// Which of an axis' three frames a component is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisFrame {
    Incoming,
    Internal,
    Outgoing,
}

/// Footprint of a component in the scattering plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Rectangle with its long side along the local x axis.
    Box { length: f64, depth: f64 },
    Circle { radius: f64 },
}

/// A rigid part placed in one of an axis' frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub shape: Shape,
    /// Centre of the shape in the frame's coordinates.
    pub center: Point2,
    /// Rotation of the shape about its centre, in radians.
    pub rotation: f64,
}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Shape, center: Point2, rotation: f64) -> Self {
        Self {
            name: name.into(),
            shape,
            center,
            rotation,
        }
    }

    /// A box spanning `from`..`to` along the frame's x axis, centred on it.
    #[must_use]
    pub fn arm(name: impl Into<String>, from: f64, to: f64, depth: f64) -> Self {
        Self::new(
            name,
            Shape::Box {
                length: to - from,
                depth,
            },
            Point2::new(0.5 * (from + to), 0.0),
            0.0,
        )
    }

    /// Places the component in world coordinates.
    pub(crate) fn place(&self, frame: &Isometry2) -> PlacedShape {
        let local = Isometry2::new(self.center.coords, self.rotation);
        let world = frame * local;
        match self.shape {
            Shape::Box { length, depth } => {
                let (hx, hy) = (0.5 * length, 0.5 * depth);
                let corners = [
                    world * Point2::new(hx, -hy),
                    world * Point2::new(-hx, -hy),
                    world * Point2::new(-hx, hy),
                    world * Point2::new(hx, hy),
                ];
                let bounds = Aabb::from_points(&corners);
                PlacedShape::Polygon { corners, bounds }
            }
            Shape::Circle { radius } => {
                let center = world * Point2::origin();
                let r = Vector2::new(radius, radius);
                PlacedShape::Circle {
                    center,
                    radius,
                    bounds: Aabb::new(center - r, center + r),
                }
            }
        }
    }
}

/// A component transformed into world coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PlacedShape {
    Polygon { corners: [Point2; 4], bounds: Aabb },
    Circle { center: Point2, radius: f64, bounds: Aabb },
}

impl PlacedShape {
    pub(crate) fn bounds(&self) -> &Aabb {
        match self {
            Self::Polygon { bounds, .. } | Self::Circle { bounds, .. } => bounds,
        }
    }
}

/// Closed interval of permitted angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleLimits {
    pub min: f64,
    pub max: f64,
}

impl AngleLimits {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// One rotation stage of the instrument (monochromator, sample or analyser).
///
/// The incoming frame sits at `position` in the previous axis' outgoing
/// frame, rotated by `angle_in`. The internal and outgoing frames rotate the
/// incoming frame by the crystal and scattering angle respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub position: Point2,
    pub angle_in: f64,
    pub limits_in: Option<AngleLimits>,
    pub limits_internal: Option<AngleLimits>,
    pub limits_out: Option<AngleLimits>,
    /// Angular speed of the scattering (outgoing) rotation.
    pub speed_out: Option<f64>,
    pub components: Vec<(AxisFrame, Component)>,
}

/// World transforms of an axis' three frames for one pose.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AxisFrames {
    pub incoming: Isometry2,
    pub internal: Isometry2,
    pub outgoing: Isometry2,
}

impl AxisFrames {
    pub(crate) fn get(&self, frame: AxisFrame) -> &Isometry2 {
        match frame {
            AxisFrame::Incoming => &self.incoming,
            AxisFrame::Internal => &self.internal,
            AxisFrame::Outgoing => &self.outgoing,
        }
    }
}

impl Axis {
    /// Creates an axis without components or limits.
    #[must_use]
    pub fn new(name: impl Into<String>, position: Point2) -> Self {
        Self {
            name: name.into(),
            position,
            angle_in: 0.0,
            limits_in: None,
            limits_internal: None,
            limits_out: None,
            speed_out: None,
            components: Vec::new(),
        }
    }

    /// Attaches a component to one of the axis frames.
    #[must_use]
    pub fn with_component(mut self, frame: AxisFrame, component: Component) -> Self {
        self.components.push((frame, component));
        self
    }

    /// Returns `true` if the given internal and outgoing angles respect all limits.
    #[must_use]
    pub fn angles_within_limits(&self, internal: f64, outgoing: f64) -> bool {
        let ok = |limits: Option<AngleLimits>, angle: f64| limits.is_none_or(|l| l.contains(angle));
        ok(self.limits_in, self.angle_in)
            && ok(self.limits_internal, internal)
            && ok(self.limits_out, outgoing)
    }

    pub(crate) fn frames(&self, previous: &Isometry2, internal: f64, outgoing: f64) -> AxisFrames {
        let incoming = previous * Isometry2::new(self.position.coords, self.angle_in);
        AxisFrames {
            incoming,
            internal: incoming * Isometry2::rotation(internal),
            outgoing: incoming * Isometry2::rotation(outgoing),
        }
    }
}
