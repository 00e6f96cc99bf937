//! Standing constraints and the collisions they generate.
//!
//! A [`Connector`] is a persistent bilateral constraint between two bodies,
//! created once at scene setup and queried every step. It does not resolve
//! anything itself: once per step it rewrites the contact geometry of its
//! [`ConnectorCollision`], which then flows through the same capability set
//! and impulse path as every other collision.

use impact_types::{BodyId, BodyLookup, CollisionTolerance, Result, Unit, Vector2};

use crate::event::{Collision, CollisionEvent, UpdateContext};
use crate::rigid::RigidBodyCollision;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Below this anchor separation the joint keeps its previous normal.
const NORMAL_EPSILON: f64 = 1e-12;

/// Unique identifier for a connector in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectorId(pub u64);

impl ConnectorId {
    /// Create a new connector ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Connector({})", self.0)
    }
}

/// A standing bilateral constraint between two bodies.
///
/// Exposes exactly one operation to the collision layer: rewrite a
/// collision's contact geometry (point, normal, distance) to reflect the
/// current constraint violation. Resolution is delegated uniformly through
/// the [`Collision`] capability set.
pub trait Connector {
    /// The two constrained bodies: (reference, primary). The primary body
    /// receives the positive-direction impulse.
    fn bodies(&self) -> (BodyId, BodyId);

    /// Rewrite the collision's geometry in place from current body state.
    fn update_collision(
        &self,
        collision: &mut RigidBodyCollision,
        bodies: &dyn BodyLookup,
    ) -> Result<()>;
}

/// Read access to connectors by ID.
pub trait ConnectorLookup {
    /// The connector with the given ID.
    fn connector(&self, id: ConnectorId) -> Result<&dyn Connector>;
}

/// An owning set of connectors, indexed by [`ConnectorId`].
///
/// Connectors are owned by the scene and outlive individual steps; the
/// engine never retains connector collisions across steps beyond what the
/// set itself manages.
#[derive(Default)]
pub struct ConnectorSet {
    connectors: Vec<Box<dyn Connector>>,
}

impl ConnectorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connector, returning its ID.
    pub fn add(&mut self, connector: Box<dyn Connector>) -> ConnectorId {
        let id = ConnectorId::new(self.connectors.len() as u64);
        self.connectors.push(connector);
        id
    }

    /// Number of connectors in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Iterate over connectors with their IDs.
    pub fn iter(&self) -> impl Iterator<Item = (ConnectorId, &dyn Connector)> {
        self.connectors
            .iter()
            .enumerate()
            .map(|(i, c)| (ConnectorId::new(i as u64), c.as_ref()))
    }
}

impl ConnectorLookup for ConnectorSet {
    fn connector(&self, id: ConnectorId) -> Result<&dyn Connector> {
        self.connectors
            .get(id.raw() as usize)
            .map(AsRef::as_ref)
            .ok_or(impact_types::ImpactError::UnknownConnector(id.raw()))
    }
}

impl std::fmt::Debug for ConnectorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorSet")
            .field("len", &self.connectors.len())
            .finish()
    }
}

/// A collision generated by a [`Connector`].
///
/// Always bilateral. Carries a read-only back-handle to the connector that
/// generated it, used for re-derivation and diagnostics only; the connector
/// owns the collision's lifecycle, never the other way around.
///
/// Updating is two-phase: the connector first regenerates the contact
/// geometry into the embedded rigid-body collision, then the base refresh
/// re-derives the relative normal velocity and runs the consistency check.
///
/// Similarity is always false: connector collisions are never merged, since
/// each corresponds to a distinct persistent constraint slot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectorCollision {
    rigid: RigidBodyCollision,
    connector: ConnectorId,
}

impl ConnectorCollision {
    /// Create and immediately update a collision for the given connector.
    ///
    /// This is the per-step refresh path: the connector regenerates the
    /// geometry before the value is handed to the engine, so there is no
    /// window where the collision carries stale or placeholder state.
    pub fn create(
        id: ConnectorId,
        connector: &dyn Connector,
        bodies: &dyn BodyLookup,
        time: f64,
        tolerance: CollisionTolerance,
    ) -> Result<Self> {
        let (reference, primary) = connector.bodies();
        let anchor = bodies.body(reference)?.state.position;
        let mut rigid = RigidBodyCollision::new(
            primary,
            reference,
            true,
            anchor,
            Vector2::x_axis(),
            0.0,
            time,
            tolerance,
        );
        connector.update_collision(&mut rigid, bodies)?;
        rigid.refresh(bodies)?;
        Ok(Self {
            rigid,
            connector: id,
        })
    }

    /// The connector that generated this collision (read path only).
    #[must_use]
    pub fn connector(&self) -> ConnectorId {
        self.connector
    }

    /// The underlying contact geometry.
    #[must_use]
    pub fn geometry(&self) -> &RigidBodyCollision {
        &self.rigid
    }
}

impl Collision for ConnectorCollision {
    fn distance(&self) -> f64 {
        self.rigid.distance()
    }

    fn bodies(&self) -> (BodyId, BodyId) {
        self.rigid.bodies()
    }

    fn direction(&self) -> Unit<Vector2<f64>> {
        self.rigid.direction()
    }

    fn is_bilateral(&self) -> bool {
        true
    }

    fn tolerance(&self) -> CollisionTolerance {
        self.rigid.tolerance()
    }

    fn needs_handling(&self) -> bool {
        self.rigid.needs_handling()
    }

    fn set_needs_handling(&mut self, needs: bool) {
        self.rigid.set_needs_handling(needs);
    }

    fn impulse(&self) -> Option<f64> {
        self.rigid.impulse()
    }

    fn record_impulse(&mut self, magnitude: f64) {
        self.rigid.record_impulse(magnitude);
    }

    fn detected_time(&self) -> f64 {
        self.rigid.detected_time()
    }

    fn velocity(&self, bodies: &dyn BodyLookup) -> Result<f64> {
        self.rigid.velocity(bodies)
    }

    fn update_collision(&mut self, ctx: &UpdateContext<'_>, _time: f64) -> Result<()> {
        // Phase one: the connector regenerates point/normal/distance.
        ctx.connectors
            .connector(self.connector)?
            .update_collision(&mut self.rigid, ctx.bodies)?;
        // Phase two: shared refresh and consistency check.
        self.rigid.refresh(ctx.bodies)
    }

    fn similar_to(&self, _other: &CollisionEvent) -> bool {
        false
    }
}

/// A pin joint holding two anchor points together.
///
/// The anchors are fixed offsets from each body's center. The constraint
/// violation is the separation between the two world anchor points; the
/// contact normal is the direction from the reference anchor toward the
/// primary anchor, and the violation distance is the anchor separation.
///
/// # Example
///
/// ```
/// use impact_collision::{Connector, PinJoint};
/// use impact_types::BodyId;
/// use nalgebra::Vector2;
///
/// let joint = PinJoint::new(BodyId::new(0), BodyId::new(1))
///     .with_anchors(Vector2::new(0.5, 0.0), Vector2::new(-0.5, 0.0));
/// assert_eq!(joint.bodies(), (BodyId::new(0), BodyId::new(1)));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinJoint {
    /// Reference body.
    body_a: BodyId,
    /// Primary body.
    body_b: BodyId,
    /// Anchor offset from the reference body's center.
    anchor_a: Vector2<f64>,
    /// Anchor offset from the primary body's center.
    anchor_b: Vector2<f64>,
}

impl PinJoint {
    /// Create a pin joint between two body centers.
    #[must_use]
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            anchor_a: Vector2::zeros(),
            anchor_b: Vector2::zeros(),
        }
    }

    /// Set the anchor offsets from each body's center.
    #[must_use]
    pub fn with_anchors(mut self, anchor_a: Vector2<f64>, anchor_b: Vector2<f64>) -> Self {
        self.anchor_a = anchor_a;
        self.anchor_b = anchor_b;
        self
    }
}

impl Connector for PinJoint {
    fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    fn update_collision(
        &self,
        collision: &mut RigidBodyCollision,
        bodies: &dyn BodyLookup,
    ) -> Result<()> {
        let pa = bodies.body(self.body_a)?.state.position + self.anchor_a;
        let pb = bodies.body(self.body_b)?.state.position + self.anchor_b;

        let separation = pb - pa;
        let gap = separation.norm();
        let normal = if gap > NORMAL_EPSILON {
            Unit::new_normalize(separation)
        } else {
            // Anchors coincide: the violation is zero and the previous
            // normal stays valid.
            collision.normal()
        };

        collision.set_geometry(pa, pb, normal, gap);
        Ok(())
    }
}
