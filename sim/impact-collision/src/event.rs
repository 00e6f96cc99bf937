//! The collision capability set and the tagged event variant.

use impact_types::{BodyId, BodyLookup, CollisionTolerance, Result, Unit, Vector2};

use crate::connector::{ConnectorCollision, ConnectorLookup};
use crate::pairwise::PairwiseCollision;
use crate::rigid::RigidBodyCollision;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lookups a collision needs while recomputing its geometry.
///
/// Detection and refinement phases read body state but never mutate it;
/// the context therefore carries shared references only. The body lookup
/// may serve committed state or state coasted to a candidate time, which
/// is how bisection evaluates midpoints without touching the world.
#[derive(Clone, Copy)]
pub struct UpdateContext<'a> {
    /// Body state source.
    pub bodies: &'a dyn BodyLookup,
    /// Connector resolver for connector-generated collisions.
    pub connectors: &'a dyn ConnectorLookup,
}

/// A connector lookup with nothing in it.
struct NoConnectors;

impl ConnectorLookup for NoConnectors {
    fn connector(&self, id: crate::ConnectorId) -> Result<&dyn crate::Connector> {
        Err(impact_types::ImpactError::UnknownConnector(id.raw()))
    }
}

static NO_CONNECTORS: NoConnectors = NoConnectors;

impl<'a> UpdateContext<'a> {
    /// Create a context from body and connector lookups.
    #[must_use]
    pub fn new(bodies: &'a dyn BodyLookup, connectors: &'a dyn ConnectorLookup) -> Self {
        Self { bodies, connectors }
    }

    /// Create a context with no connectors, for scenes of plain contacts.
    #[must_use]
    pub fn bodies_only(bodies: &'a dyn BodyLookup) -> Self {
        Self {
            bodies,
            connectors: &NO_CONNECTORS,
        }
    }
}

/// The minimal contract every collision-like event satisfies.
///
/// The engine drives detection, refinement, and impulse resolution entirely
/// through these operations; it never branches on the concrete variant.
///
/// Distance is a signed scalar: negative means penetration. It is always
/// recomputed from live body state by [`update_collision`], never carried
/// stale across a step.
///
/// [`update_collision`]: Collision::update_collision
pub trait Collision {
    /// Current signed distance; negative means overlap/penetration.
    fn distance(&self) -> f64;

    /// The two participants, in impulse order: the impulse pushes the
    /// first body against [`direction`] and the second along it.
    ///
    /// [`direction`]: Collision::direction
    fn bodies(&self) -> (BodyId, BodyId);

    /// The unit axis the impulse acts along, pointing from the first
    /// participant toward the second.
    fn direction(&self) -> Unit<Vector2<f64>>;

    /// True for joints/connectors (can both push and pull), false for
    /// contacts (push-only).
    fn is_bilateral(&self) -> bool;

    /// The tolerance band classifying this event's distance.
    fn tolerance(&self) -> CollisionTolerance;

    /// True when the distance has penetrated beyond tolerance and the
    /// event needs an impulse.
    fn is_colliding(&self) -> bool {
        self.tolerance().is_colliding(self.distance())
    }

    /// Looser "nearby" predicate used to decide whether to keep tracking
    /// this pair at all.
    fn is_touching(&self) -> bool {
        self.tolerance().is_touching(self.distance())
    }

    /// True when the distance is within `accuracy` of `target_gap`; with
    /// `allow_tiny`, also accepts barely-separated states below
    /// `target_gap + accuracy`.
    fn close_enough(&self, allow_tiny: bool) -> bool {
        self.tolerance().close_enough(self.distance(), allow_tiny)
    }

    /// True when the state is physically invalid (penetrating). The engine
    /// treats this as requiring forced handling, not a soft failure.
    fn illegal_state(&self) -> bool {
        self.tolerance().illegal(self.distance())
    }

    /// Whether this event still requires impulse application this step.
    fn needs_handling(&self) -> bool;

    /// Mark or clear the needs-handling flag.
    fn set_needs_handling(&mut self, needs: bool);

    /// Impulse magnitude accumulated while handling this event, `None`
    /// before the first resolution.
    fn impulse(&self) -> Option<f64>;

    /// Accumulate an applied impulse magnitude.
    fn record_impulse(&mut self, magnitude: f64);

    /// Simulation time at which this event was detected.
    fn detected_time(&self) -> f64;

    /// Relative separation speed along [`direction`]: positive means the
    /// participants are separating, negative means approaching.
    ///
    /// [`direction`]: Collision::direction
    fn velocity(&self, bodies: &dyn BodyLookup) -> Result<f64>;

    /// Recompute distance and geometry at the given time from current body
    /// state. Idempotent when called twice with the same time and no
    /// intervening body motion.
    fn update_collision(&mut self, ctx: &UpdateContext<'_>, time: f64) -> Result<()>;

    /// Whether this event and `other` describe the same physical contact
    /// and should be merged during deduplication.
    fn similar_to(&self, other: &CollisionEvent) -> bool;
}

/// A collision event owned by the engine's per-step working set.
///
/// The explicit variants make ownership and serialization simple while all
/// resolution logic dispatches through the [`Collision`] capability set.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionEvent {
    /// Simple-geometry collision between two bodies along one axis.
    Pairwise(PairwiseCollision),
    /// Contact with full rigid-body geometry.
    RigidBody(RigidBodyCollision),
    /// Collision generated by a standing connector constraint.
    Connector(ConnectorCollision),
}

impl CollisionEvent {
    fn inner(&self) -> &dyn Collision {
        match self {
            Self::Pairwise(c) => c,
            Self::RigidBody(c) => c,
            Self::Connector(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Collision {
        match self {
            Self::Pairwise(c) => c,
            Self::RigidBody(c) => c,
            Self::Connector(c) => c,
        }
    }

    /// Whether this event came from a connector.
    #[must_use]
    pub fn is_connector(&self) -> bool {
        matches!(self, Self::Connector(_))
    }
}

impl From<PairwiseCollision> for CollisionEvent {
    fn from(c: PairwiseCollision) -> Self {
        Self::Pairwise(c)
    }
}

impl From<RigidBodyCollision> for CollisionEvent {
    fn from(c: RigidBodyCollision) -> Self {
        Self::RigidBody(c)
    }
}

impl From<ConnectorCollision> for CollisionEvent {
    fn from(c: ConnectorCollision) -> Self {
        Self::Connector(c)
    }
}

impl Collision for CollisionEvent {
    fn distance(&self) -> f64 {
        self.inner().distance()
    }

    fn bodies(&self) -> (BodyId, BodyId) {
        self.inner().bodies()
    }

    fn direction(&self) -> Unit<Vector2<f64>> {
        self.inner().direction()
    }

    fn is_bilateral(&self) -> bool {
        self.inner().is_bilateral()
    }

    fn tolerance(&self) -> CollisionTolerance {
        self.inner().tolerance()
    }

    fn needs_handling(&self) -> bool {
        self.inner().needs_handling()
    }

    fn set_needs_handling(&mut self, needs: bool) {
        self.inner_mut().set_needs_handling(needs);
    }

    fn impulse(&self) -> Option<f64> {
        self.inner().impulse()
    }

    fn record_impulse(&mut self, magnitude: f64) {
        self.inner_mut().record_impulse(magnitude);
    }

    fn detected_time(&self) -> f64 {
        self.inner().detected_time()
    }

    fn velocity(&self, bodies: &dyn BodyLookup) -> Result<f64> {
        self.inner().velocity(bodies)
    }

    fn update_collision(&mut self, ctx: &UpdateContext<'_>, time: f64) -> Result<()> {
        self.inner_mut().update_collision(ctx, time)
    }

    fn similar_to(&self, other: &CollisionEvent) -> bool {
        self.inner().similar_to(other)
    }
}
