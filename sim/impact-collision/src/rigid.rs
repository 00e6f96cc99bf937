//! Rigid-body collision with full contact geometry.

use impact_types::{BodyId, BodyLookup, CollisionTolerance, Point2, Result, Unit, Vector2};

use crate::event::{Collision, CollisionEvent, UpdateContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A collision carrying full contact geometry for rigid bodies.
///
/// Beyond the shared distance/flag fields, this variant records a world
/// contact point, a unit normal determined by the *normal body*, an
/// optional normal derivative for curved contact surfaces, and a second
/// impact descriptor used for post-impact validation.
///
/// Geometry owners (a [`Connector`](crate::Connector) or an external
/// narrow-phase detector) rewrite the point/normal/distance each step via
/// [`set_geometry`](Self::set_geometry); the base update re-derives the
/// relative velocity along the normal, re-derives the distance sign from
/// the impact descriptors, and runs the consistency check.
///
/// # Invariants
///
/// Checked after every update, fatal if violated:
///
/// - the second impact descriptor is present (it is set at construction
///   and must never be cleared)
/// - a non-`None` normal derivative implies the contact is flagged as
///   having a curved ("ball") normal
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyCollision {
    /// Primary body of the collision.
    body: BodyId,
    /// The body that determines the contact normal.
    normal_body: BodyId,
    /// Contact point in world coordinates.
    impact_point: Point2<f64>,
    /// Second impact descriptor, for post-impact validation.
    impact2: Option<Point2<f64>>,
    /// Unit contact normal, pointing from `normal_body` toward `body`.
    normal: Unit<Vector2<f64>>,
    /// Derivative of the normal along the contact; present only for
    /// curved contact surfaces.
    normal_derivative: Option<Vector2<f64>>,
    /// Whether the normal comes from a curved ("ball") geometry.
    ball_normal: bool,
    /// Whether this is a bilateral (push-and-pull) constraint.
    bilateral: bool,
    /// Signed separation along the normal; negative means penetration.
    distance: f64,
    /// Relative velocity along the normal at the last update.
    normal_velocity: f64,
    /// Simulation time at which this collision was detected.
    detected_time: f64,
    /// Tolerance band classifying the distance.
    tolerance: CollisionTolerance,
    /// Whether the engine still has to apply an impulse for this event.
    must_handle: bool,
    /// Accumulated impulse magnitude, `None` before first resolution.
    impulse: Option<f64>,
}

impl RigidBodyCollision {
    /// Create a collision from detection geometry.
    ///
    /// The second impact descriptor is initialized to the contact point;
    /// geometry owners with a better descriptor overwrite it via
    /// [`set_geometry`](Self::set_geometry).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        body: BodyId,
        normal_body: BodyId,
        bilateral: bool,
        impact_point: Point2<f64>,
        normal: Unit<Vector2<f64>>,
        distance: f64,
        time: f64,
        tolerance: CollisionTolerance,
    ) -> Self {
        Self {
            body,
            normal_body,
            impact_point,
            impact2: Some(impact_point),
            normal,
            normal_derivative: None,
            ball_normal: false,
            bilateral,
            distance,
            normal_velocity: 0.0,
            detected_time: time,
            tolerance,
            must_handle: false,
            impulse: None,
        }
    }

    /// Attach a normal derivative for a curved contact surface.
    ///
    /// Also flags the normal as curved; the two always travel together.
    #[must_use]
    pub fn with_curved_normal(mut self, derivative: Vector2<f64>) -> Self {
        self.normal_derivative = Some(derivative);
        self.ball_normal = true;
        self
    }

    /// Rewrite the contact geometry in place.
    ///
    /// Called by the owner of this collision's geometry once per step,
    /// before the base update re-derives velocity and sign.
    pub fn set_geometry(
        &mut self,
        impact_point: Point2<f64>,
        impact2: Point2<f64>,
        normal: Unit<Vector2<f64>>,
        distance: f64,
    ) {
        self.impact_point = impact_point;
        self.impact2 = Some(impact2);
        self.normal = normal;
        self.distance = distance;
    }

    /// Set the raw normal derivative without touching the curved-normal
    /// flag. The flag must be kept in sync via
    /// [`set_ball_normal`](Self::set_ball_normal); the consistency check
    /// fails fast on a derivative without the flag.
    pub fn set_normal_derivative(&mut self, derivative: Option<Vector2<f64>>) {
        self.normal_derivative = derivative;
    }

    /// Set whether the normal comes from a curved geometry.
    pub fn set_ball_normal(&mut self, ball_normal: bool) {
        self.ball_normal = ball_normal;
    }

    /// The primary body.
    #[must_use]
    pub fn body(&self) -> BodyId {
        self.body
    }

    /// The body that determines the contact normal.
    #[must_use]
    pub fn normal_body(&self) -> BodyId {
        self.normal_body
    }

    /// Contact point in world coordinates.
    #[must_use]
    pub fn impact_point(&self) -> Point2<f64> {
        self.impact_point
    }

    /// The second impact descriptor.
    #[must_use]
    pub fn impact2(&self) -> Option<Point2<f64>> {
        self.impact2
    }

    /// The contact normal.
    #[must_use]
    pub fn normal(&self) -> Unit<Vector2<f64>> {
        self.normal
    }

    /// The normal derivative, present only for curved contacts.
    #[must_use]
    pub fn normal_derivative(&self) -> Option<Vector2<f64>> {
        self.normal_derivative
    }

    /// Whether the normal comes from a curved ("ball") geometry.
    #[must_use]
    pub fn has_ball_normal(&self) -> bool {
        self.ball_normal
    }

    /// Relative velocity along the normal at the last update.
    #[must_use]
    pub fn normal_velocity(&self) -> f64 {
        self.normal_velocity
    }

    /// Verify the geometry invariants; panics on programmer error.
    ///
    /// # Panics
    ///
    /// If the second impact descriptor is absent, or a normal derivative
    /// is present on a contact not flagged as curved.
    pub fn check_consistent(&self) {
        assert!(
            self.impact2.is_some(),
            "rigid-body collision lost its second impact descriptor"
        );
        if self.normal_derivative.is_some() {
            // Having a derivative of the normal implies the normal is curved.
            assert!(
                self.ball_normal,
                "normal derivative present on a flat contact"
            );
        }
    }

    /// Base geometry refresh: re-derive the relative velocity along the
    /// normal and the distance sign, then check consistency.
    pub(crate) fn refresh(&mut self, bodies: &dyn BodyLookup) -> Result<()> {
        let primary = bodies.body(self.body)?;
        let reference = bodies.body(self.normal_body)?;
        let n = self.normal.into_inner();

        self.normal_velocity = (primary.state.velocity - reference.state.velocity).dot(&n);

        // The impact descriptors carry the separation direction: crossing
        // to the other side of the stored normal flips the distance sign.
        if let Some(p2) = self.impact2 {
            if (p2 - self.impact_point).dot(&n) < 0.0 {
                self.distance = -self.distance.abs();
            }
        }

        self.check_consistent();
        Ok(())
    }
}

impl Collision for RigidBodyCollision {
    fn distance(&self) -> f64 {
        self.distance
    }

    fn bodies(&self) -> (BodyId, BodyId) {
        (self.normal_body, self.body)
    }

    fn direction(&self) -> Unit<Vector2<f64>> {
        self.normal
    }

    fn is_bilateral(&self) -> bool {
        self.bilateral
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
        let primary = bodies.body(self.body)?;
        let reference = bodies.body(self.normal_body)?;
        Ok((primary.state.velocity - reference.state.velocity).dot(&self.normal.into_inner()))
    }

    fn update_collision(&mut self, ctx: &UpdateContext<'_>, _time: f64) -> Result<()> {
        self.refresh(ctx.bodies)
    }

    fn similar_to(&self, other: &CollisionEvent) -> bool {
        match other {
            CollisionEvent::RigidBody(other) => {
                (self.body == other.body && self.normal_body == other.normal_body)
                    || (self.body == other.normal_body && self.normal_body == other.body)
            }
            _ => false,
        }
    }
}
