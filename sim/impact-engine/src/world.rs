//! Simulation world container.
//!
//! The [`World`] owns the bodies and connectors of a scene, tracks
//! simulation time, and supports saving and restoring the initial state.
//! Between collisions, bodies coast at constant velocity; [`World::drift`]
//! advances (or rewinds) that motion, and [`World::state_at`] provides a
//! read-only view of the scene coasted to a candidate time for
//! collision-time refinement.

use hashbrown::HashMap;
use impact_collision::{Connector, ConnectorId, ConnectorLookup, ConnectorSet};
use impact_types::{Body, BodyId, BodyLookup, ImpactError, Result};

/// The simulation state container: bodies, connectors, and time.
///
/// # Example
///
/// ```
/// use impact_engine::World;
/// use impact_types::Body;
/// use nalgebra::{Point2, Vector2};
///
/// let mut world = World::new();
/// let id = world.add_body(Body::block(
///     1.0,
///     Point2::origin(),
///     Vector2::new(0.5, 0.5),
/// ));
///
/// world.save_initial_state();
/// world.drift(1.0);
/// world.reset().unwrap();
/// assert_eq!(world.time(), 0.0);
/// assert!(world.body(id).is_ok());
/// ```
#[derive(Debug, Default)]
pub struct World {
    bodies: HashMap<BodyId, Body>,
    /// Insertion order, for deterministic pair scans.
    order: Vec<BodyId>,
    next_id: u64,
    connectors: ConnectorSet,
    time: f64,
    initial: Option<InitialState>,
}

#[derive(Debug)]
struct InitialState {
    bodies: HashMap<BodyId, Body>,
    order: Vec<BodyId>,
    next_id: u64,
    time: f64,
}

impl World {
    /// Create an empty world at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body, returning its ID.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = BodyId::new(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, body);
        self.order.push(id);
        id
    }

    /// Immutable access to a body.
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies
            .get(&id)
            .ok_or(ImpactError::UnknownBody(id.raw()))
    }

    /// Mutable access to a body.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies
            .get_mut(&id)
            .ok_or(ImpactError::UnknownBody(id.raw()))
    }

    /// Body IDs in insertion order.
    #[must_use]
    pub fn ids(&self) -> &[BodyId] {
        &self.order
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Current simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Add a connector, returning its ID.
    pub fn add_connector(&mut self, connector: Box<dyn Connector>) -> ConnectorId {
        self.connectors.add(connector)
    }

    /// The scene's connectors.
    #[must_use]
    pub fn connectors(&self) -> &ConnectorSet {
        &self.connectors
    }

    /// Coast every body at its current velocity for `dt` seconds and
    /// advance the clock. Negative `dt` rewinds, which is how the engine
    /// backs the scene up to a refined collision time.
    pub fn drift(&mut self, dt: f64) {
        for body in self.bodies.values_mut() {
            body.state = body.state.coasted(dt);
        }
        self.time += dt;
    }

    /// A read-only view of the scene coasted to the given time.
    ///
    /// Committed state is untouched; refinement evaluates candidate times
    /// through this view.
    #[must_use]
    pub fn state_at(&self, time: f64) -> StateAt<'_> {
        StateAt { world: self, time }
    }

    /// Save the current bodies and time as the initial state.
    pub fn save_initial_state(&mut self) {
        self.initial = Some(InitialState {
            bodies: self.bodies.clone(),
            order: self.order.clone(),
            next_id: self.next_id,
            time: self.time,
        });
    }

    /// Restore the saved initial state.
    pub fn reset(&mut self) -> Result<()> {
        let initial = self
            .initial
            .as_ref()
            .ok_or(ImpactError::InitialStateMissing)?;
        let bodies = initial.bodies.clone();
        let order = initial.order.clone();
        let next_id = initial.next_id;
        let time = initial.time;

        self.bodies = bodies;
        self.order = order;
        self.next_id = next_id;
        self.time = time;
        Ok(())
    }

    /// Fail with a divergence error if any body state is non-finite.
    pub fn check_finite(&self) -> Result<()> {
        for (id, body) in &self.bodies {
            if !body.is_finite() {
                return Err(ImpactError::diverged(format!(
                    "{id} has non-finite state"
                )));
            }
        }
        Ok(())
    }
}

impl BodyLookup for World {
    fn body(&self, id: BodyId) -> Result<Body> {
        self.bodies
            .get(&id)
            .copied()
            .ok_or(ImpactError::UnknownBody(id.raw()))
    }
}

impl ConnectorLookup for World {
    fn connector(&self, id: ConnectorId) -> Result<&dyn Connector> {
        self.connectors.connector(id)
    }
}

/// A read-only view of a [`World`] with bodies coasted to a fixed time.
#[derive(Clone, Copy)]
pub struct StateAt<'a> {
    world: &'a World,
    time: f64,
}

impl StateAt<'_> {
    /// The time this view evaluates at.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }
}

impl BodyLookup for StateAt<'_> {
    fn body(&self, id: BodyId) -> Result<Body> {
        let mut body = BodyLookup::body(self.world, id)?;
        body.state = body.state.coasted(self.time - self.world.time);
        Ok(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use impact_collision::PinJoint;
    use impact_types::BodyState;
    use nalgebra::{Point2, Vector2};

    fn moving_body() -> Body {
        Body::new(
            BodyState::new(Point2::origin(), Vector2::new(2.0, 0.0)),
            impact_types::MassProperties::point_mass(1.0),
            Vector2::new(0.5, 0.5),
        )
    }

    #[test]
    fn test_add_and_lookup() {
        let mut world = World::new();
        let id = world.add_body(moving_body());

        assert_eq!(world.len(), 1);
        assert!(world.body(id).is_ok());
        assert!(matches!(
            world.body(BodyId::new(99)),
            Err(ImpactError::UnknownBody(99))
        ));
    }

    #[test]
    fn test_drift_and_rewind() {
        let mut world = World::new();
        let id = world.add_body(moving_body());

        world.drift(0.5);
        assert_relative_eq!(world.time(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(world.body(id).unwrap().state.position.x, 1.0, epsilon = 1e-12);

        world.drift(-0.25);
        assert_relative_eq!(world.time(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(world.body(id).unwrap().state.position.x, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_state_at_leaves_committed_state_alone() {
        let mut world = World::new();
        let id = world.add_body(moving_body());

        let view = world.state_at(0.75);
        let coasted = BodyLookup::body(&view, id).unwrap();
        assert_relative_eq!(coasted.state.position.x, 1.5, epsilon = 1e-12);

        // Committed state unchanged
        assert_relative_eq!(world.body(id).unwrap().state.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(world.time(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_save_and_reset() {
        let mut world = World::new();
        let id = world.add_body(moving_body());
        world.save_initial_state();

        world.drift(1.0);
        world.body_mut(id).unwrap().state.velocity.x = -3.0;

        world.reset().unwrap();
        assert_relative_eq!(world.time(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(world.body(id).unwrap().state.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(world.body(id).unwrap().state.velocity.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_without_save_is_an_error() {
        let mut world = World::new();
        assert!(matches!(
            world.reset(),
            Err(ImpactError::InitialStateMissing)
        ));
    }

    #[test]
    fn test_check_finite() {
        let mut world = World::new();
        let id = world.add_body(moving_body());
        assert!(world.check_finite().is_ok());

        world.body_mut(id).unwrap().state.velocity.x = f64::NAN;
        assert!(world.check_finite().unwrap_err().is_diverged());
    }

    #[test]
    fn test_connector_registry() {
        let mut world = World::new();
        let a = world.add_body(moving_body());
        let b = world.add_body(moving_body());
        let id = world.add_connector(Box::new(PinJoint::new(a, b)));

        assert_eq!(world.connectors().len(), 1);
        assert!(world.connector(id).is_ok());
    }
}
