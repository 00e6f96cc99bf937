//! Pairwise collision between two bodies along one axis.

use impact_types::{BodyId, BodyLookup, CollisionTolerance, Result, Unit, Vector2};

use crate::event::{Collision, CollisionEvent, UpdateContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this center separation the detection axis falls back to X.
const AXIS_EPSILON: f64 = 1e-12;

/// A collision between two movable bodies along a single axis.
///
/// The distance is the gap between the bodies' facing extents projected on
/// the collision axis; for the classic one-dimensional case this is the
/// right edge of the left block to the left edge of the right block. Two
/// pairwise collisions are *similar* (candidates for merging) when they
/// reference the same unordered pair of bodies.
///
/// This is a unilateral contact: it can push the bodies apart but never
/// pull them together.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairwiseCollision {
    /// First participant (the "left" body along the axis).
    left: BodyId,
    /// Second participant.
    right: BodyId,
    /// Collision axis, pointing from `left` toward `right`.
    axis: Unit<Vector2<f64>>,
    /// Simulation time at which this collision was detected.
    detected_time: f64,
    /// Tolerance band classifying the distance.
    tolerance: CollisionTolerance,
    /// Gap between facing extents; negative means penetration.
    distance: f64,
    /// Whether the engine still has to apply an impulse for this event.
    must_handle: bool,
    /// Accumulated impulse magnitude, `None` before first resolution.
    impulse: Option<f64>,
}

impl PairwiseCollision {
    /// Detect a collision between two bodies, deriving the axis from their
    /// current center offset (falling back to X for coincident centers).
    ///
    /// The distance is computed immediately; there is no partially
    /// initialized state.
    pub fn detect(
        left: BodyId,
        right: BodyId,
        bodies: &dyn BodyLookup,
        time: f64,
        tolerance: CollisionTolerance,
    ) -> Result<Self> {
        let offset = bodies.body(right)?.state.position - bodies.body(left)?.state.position;
        let axis = if offset.norm() > AXIS_EPSILON {
            Unit::new_normalize(offset)
        } else {
            Vector2::x_axis()
        };
        Self::with_axis(left, right, axis, bodies, time, tolerance)
    }

    /// Detect a collision along an explicit axis.
    pub fn with_axis(
        left: BodyId,
        right: BodyId,
        axis: Unit<Vector2<f64>>,
        bodies: &dyn BodyLookup,
        time: f64,
        tolerance: CollisionTolerance,
    ) -> Result<Self> {
        let mut collision = Self {
            left,
            right,
            axis,
            detected_time: time,
            tolerance,
            distance: 0.0,
            must_handle: false,
            impulse: None,
        };
        collision.distance = collision.gap(bodies)?;
        Ok(collision)
    }

    /// The collision axis.
    #[must_use]
    pub fn axis(&self) -> Unit<Vector2<f64>> {
        self.axis
    }

    /// Gap between the two bodies' facing extents along the axis.
    fn gap(&self, bodies: &dyn BodyLookup) -> Result<f64> {
        let left = bodies.body(self.left)?;
        let right = bodies.body(self.right)?;
        let n = self.axis.into_inner();

        let centers = (right.state.position - left.state.position).dot(&n);
        Ok(centers - left.extent_along(&self.axis) - right.extent_along(&self.axis))
    }
}

impl Collision for PairwiseCollision {
    fn distance(&self) -> f64 {
        self.distance
    }

    fn bodies(&self) -> (BodyId, BodyId) {
        (self.left, self.right)
    }

    fn direction(&self) -> Unit<Vector2<f64>> {
        self.axis
    }

    fn is_bilateral(&self) -> bool {
        false
    }

    fn tolerance(&self) -> CollisionTolerance {
        self.tolerance
    }

    fn needs_handling(&self) -> bool {
        self.must_handle
    }

    fn set_needs_handling(&mut self, needs: bool) {
        self.must_handle = needs;
    }

    fn impulse(&self) -> Option<f64> {
        self.impulse
    }

    fn record_impulse(&mut self, magnitude: f64) {
        self.impulse = Some(self.impulse.unwrap_or(0.0) + magnitude.abs());
    }

    fn detected_time(&self) -> f64 {
        self.detected_time
    }

    fn velocity(&self, bodies: &dyn BodyLookup) -> Result<f64> {
        let left = bodies.body(self.left)?;
        let right = bodies.body(self.right)?;
        Ok((right.state.velocity - left.state.velocity).dot(&self.axis.into_inner()))
    }

    fn update_collision(&mut self, ctx: &UpdateContext<'_>, _time: f64) -> Result<()> {
        self.distance = self.gap(ctx.bodies)?;
        Ok(())
    }

    fn similar_to(&self, other: &CollisionEvent) -> bool {
        match other {
            CollisionEvent::Pairwise(other) => {
                (self.left == other.left && self.right == other.right)
                    || (self.left == other.right && self.right == other.left)
            }
            _ => false,
        }
    }
}
