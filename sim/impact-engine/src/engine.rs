//! The collision resolution driver.
//!
//! One step runs to completion before the next begins: collect candidate
//! collisions, refine event timing, deduplicate similar events, apply
//! impulses most-overdue first, and verify the result. Detection and
//! refinement only read body state; velocities are mutated exclusively
//! during the resolution phase.

use impact_collision::{
    Collision, CollisionEvent, ConnectorCollision, PairwiseCollision, UpdateContext,
};
use impact_types::{BodyId, EngineConfig, ImpactError, Result};

use crate::refine::{refine_collision_time, Bracket};
use crate::world::World;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A collision that received an impulse this step, for diagnostics.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandledCollision {
    /// The two participants.
    pub bodies: (BodyId, BodyId),
    /// Whether the event was a bilateral constraint.
    pub bilateral: bool,
    /// Final distance after resolution.
    pub distance: f64,
    /// Total impulse magnitude applied.
    pub impulse: Option<f64>,
}

/// Diagnostics for one completed step.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepReport {
    /// Simulation time at the end of the step. When a collision time was
    /// refined, the step ends there rather than at the nominal step end.
    pub time: f64,
    /// Number of collision events tracked this step.
    pub tracked: usize,
    /// Collisions that received an impulse, with final state.
    pub handled: Vec<HandledCollision>,
    /// Refinements that gave up at the minimum bracket width.
    pub unresolved_refinements: usize,
    /// Whether any penetration survived all resolution passes.
    pub residual_penetration: bool,
}

/// Collects, refines, deduplicates, and resolves collisions each step.
///
/// The engine owns its per-step working set of events and hands it back in
/// the [`StepReport`]; nothing is retained across steps. Connectors are
/// owned by the [`World`] and asked for a fresh collision every step.
///
/// # Example
///
/// ```
/// use impact_engine::{CollisionEngine, World};
/// use impact_types::{Body, BodyState, EngineConfig, MassProperties};
/// use nalgebra::{Point2, Vector2};
///
/// let mut world = World::new();
/// // A block sliding right at 1 m/s ...
/// let left = world.add_body(Body::new(
///     BodyState::new(Point2::origin(), Vector2::new(1.0, 0.0)),
///     MassProperties::point_mass(1.0),
///     Vector2::new(0.5, 0.5),
/// ));
/// // ... toward a wall 6 mm away.
/// world.add_body(Body::fixed_block(
///     Point2::new(1.006, 0.0),
///     Vector2::new(0.5, 0.5),
/// ));
///
/// let engine = CollisionEngine::new(EngineConfig::default());
/// let report = engine.step(&mut world, 0.01).unwrap();
///
/// // The block bounced off the wall elastically.
/// assert_eq!(report.handled.len(), 1);
/// let v = world.body(left).unwrap().state.velocity.x;
/// assert!((v + 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct CollisionEngine {
    config: EngineConfig,
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CollisionEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Advance the world by `dt`, then detect and resolve collisions.
    ///
    /// Bodies coast at constant velocity for the step; the collision
    /// pipeline then runs to completion: scan, refine, dedup, resolve,
    /// verify. If a collision time was refined inside the step, the world
    /// is rewound to that time before impulses are applied, so the report's
    /// `time` may be earlier than `world.time() + dt` was going to be.
    pub fn step(&self, world: &mut World, dt: f64) -> Result<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ImpactError::invalid_config(
                "step size must be positive and finite",
            ));
        }

        let start = world.time();
        world.drift(dt);
        let now = world.time();

        let mut events = self.collect(world, now)?;
        dedupe_events(&mut events);

        // Refine event times for contacts that ended the step penetrating.
        let mut unresolved = 0;
        let mut resolve_time = now;
        for event in &mut events {
            if event.is_bilateral() || !event.illegal_state() {
                continue;
            }
            let outcome =
                refine_collision_time(event, world, Bracket::new(start, now), &self.config)?;
            if !outcome.converged {
                unresolved += 1;
            }
            if outcome.time < resolve_time {
                resolve_time = outcome.time;
            }
        }
        if resolve_time < now {
            // Back the scene up to the earliest refined event time.
            world.drift(resolve_time - now);
        }
        self.update_all(&mut events, world)?;

        // Resolution passes: impulses most-overdue first, re-updating
        // between passes so later events see earlier velocity changes.
        // Residual penetration forces another pass, up to the retry bound.
        for _pass in 0..self.config.max_resolution_passes {
            let mut pending = self.classify(&mut events, world)?;
            if pending.is_empty() {
                break;
            }
            pending.sort_by(|&a, &b| events[a].distance().total_cmp(&events[b].distance()));
            for index in pending {
                self.apply_impulse(&mut events[index], world)?;
            }
            self.update_all(&mut events, world)?;
        }

        let residual_penetration = events.iter().any(|event| event.illegal_state());
        if residual_penetration {
            tracing::warn!(
                time = world.time(),
                "penetration persists after {} resolution passes",
                self.config.max_resolution_passes
            );
        }
        world.check_finite()?;

        Ok(StepReport {
            time: world.time(),
            tracked: events.len(),
            handled: events
                .iter()
                .filter(|event| event.impulse().is_some())
                .map(|event| HandledCollision {
                    bodies: event.bodies(),
                    bilateral: event.is_bilateral(),
                    distance: event.distance(),
                    impulse: event.impulse(),
                })
                .collect(),
            unresolved_refinements: unresolved,
            residual_penetration,
        })
    }

    /// Apply a single impulse that restores this event's velocity
    /// constraint, scaled by the participants' inverse masses.
    ///
    /// For unilateral contacts the post-impulse relative velocity is
    /// `-restitution` times the incoming one; bilateral constraints are
    /// driven to zero relative velocity. With one participant fixed the
    /// change degenerates to a one-sided velocity flip. Two fixed
    /// participants are an error, not a division fault.
    pub fn apply_impulse(&self, event: &mut CollisionEvent, world: &mut World) -> Result<f64> {
        let (first, second) = event.bodies();
        let normal = event.direction().into_inner();
        let relative_velocity = event.velocity(world)?;

        let restitution = if event.is_bilateral() {
            0.0
        } else {
            self.config.restitution
        };

        let inverse_a = world.body(first)?.mass.inverse_mass();
        let inverse_b = world.body(second)?.mass.inverse_mass();
        let denominator = inverse_a + inverse_b;
        if denominator == 0.0 {
            return Err(ImpactError::no_finite_mass(first, second));
        }

        let impulse = -(1.0 + restitution) * relative_velocity / denominator;
        if inverse_a > 0.0 {
            world.body_mut(first)?.state.velocity -= normal * (impulse * inverse_a);
        }
        if inverse_b > 0.0 {
            world.body_mut(second)?.state.velocity += normal * (impulse * inverse_b);
        }

        event.record_impulse(impulse);
        event.set_needs_handling(false);
        Ok(impulse)
    }

    /// Scan body pairs and connectors for this step's candidate events.
    fn collect(&self, world: &World, now: f64) -> Result<Vec<CollisionEvent>> {
        let mut events = Vec::new();

        let ids = world.ids();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let candidate =
                    PairwiseCollision::detect(a, b, world, now, self.config.tolerance)?;
                if candidate.is_touching() {
                    events.push(candidate.into());
                }
            }
        }

        for (id, connector) in world.connectors().iter() {
            let collision =
                ConnectorCollision::create(id, connector, world, now, self.config.tolerance)?;
            events.push(collision.into());
        }

        Ok(events)
    }

    /// Re-evaluate every event against committed world state.
    fn update_all(&self, events: &mut [CollisionEvent], world: &World) -> Result<()> {
        let time = world.time();
        let ctx = UpdateContext::new(world, world);
        for event in events {
            event.update_collision(&ctx, time)?;
        }
        Ok(())
    }

    /// Decide which events still need an impulse, marking their flags.
    ///
    /// A unilateral contact needs handling when its participants are
    /// approaching and the gap is at (or below) the resolved band; an
    /// already-separating contact needs nothing. A bilateral constraint
    /// needs handling whenever its relative velocity is off zero.
    fn classify(&self, events: &mut [CollisionEvent], world: &World) -> Result<Vec<usize>> {
        let mut pending = Vec::new();
        for (index, event) in events.iter_mut().enumerate() {
            let velocity = event.velocity(world)?;
            let needs = if event.is_bilateral() {
                velocity.abs() > self.config.resting_velocity
            } else {
                let approaching = velocity < -self.config.resting_velocity;
                approaching
                    && (event.illegal_state()
                        || event.close_enough(false)
                        || event.close_enough(true))
            };
            event.set_needs_handling(needs);
            if needs {
                pending.push(index);
            }
        }
        Ok(pending)
    }
}

/// Merge events that describe the same physical contact, keeping the one
/// with the smaller (more overdue) distance. Connector-generated events
/// are never similar and therefore never folded.
pub fn dedupe_events(events: &mut Vec<CollisionEvent>) {
    let mut i = 0;
    while i < events.len() {
        let mut j = i + 1;
        while j < events.len() {
            if events[i].similar_to(&events[j]) {
                if events[j].distance() < events[i].distance() {
                    events.swap(i, j);
                }
                events.swap_remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use impact_collision::{CollisionTolerance, PinJoint};
    use impact_types::{Body, BodyState, MassProperties};
    use nalgebra::{Point2, Vector2};

    /// Two equal blocks: the left one closing at 1 m/s, edges 2 mm apart.
    fn closing_pair() -> (World, BodyId, BodyId) {
        let mut world = World::new();
        let left = world.add_body(Body::new(
            BodyState::new(Point2::origin(), Vector2::new(1.0, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.5, 0.5),
        ));
        let right = world.add_body(Body::new(
            BodyState::at_rest(Point2::new(1.102, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.6, 0.5),
        ));
        (world, left, right)
    }

    #[test]
    fn test_penetrating_pair_is_resolved() {
        // Drifting 4 ms turns the 2 mm gap into 2 mm of penetration with
        // closing velocity -1; resolution must leave the pair separated
        // inside [0, 0.01] with nothing left to handle.
        let (mut world, left, right) = closing_pair();
        let engine = CollisionEngine::default();

        let report = engine.step(&mut world, 0.004).unwrap();

        assert_eq!(report.handled.len(), 1);
        let handled = &report.handled[0];
        assert!(handled.distance >= 0.0 && handled.distance <= 0.01);
        assert!(handled.impulse.is_some());
        assert!(!handled.bilateral);
        assert!(!report.residual_penetration);

        // Elastic bounce between equal masses swaps the velocities.
        assert_relative_eq!(
            world.body(left).unwrap().state.velocity.x,
            0.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            world.body(right).unwrap().state.velocity.x,
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_restitution_scales_separation_speed() {
        let (mut world, left, right) = closing_pair();
        let engine = CollisionEngine::new(EngineConfig::default().with_restitution(0.5));

        engine.step(&mut world, 0.004).unwrap();

        let v_left = world.body(left).unwrap().state.velocity.x;
        let v_right = world.body(right).unwrap().state.velocity.x;
        // Incoming relative velocity -1, outgoing +0.5
        assert_relative_eq!(v_right - v_left, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_body_flips_the_mover() {
        let mut world = World::new();
        let mover = world.add_body(Body::new(
            BodyState::new(Point2::origin(), Vector2::new(1.0, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.5, 0.5),
        ));
        let wall = world.add_body(Body::fixed_block(
            Point2::new(1.002, 0.0),
            Vector2::new(0.5, 0.5),
        ));

        let engine = CollisionEngine::default();
        engine.step(&mut world, 0.004).unwrap();

        assert_relative_eq!(
            world.body(mover).unwrap().state.velocity.x,
            -1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(world.body(wall).unwrap().state.velocity.x, 0.0);
    }

    #[test]
    fn test_two_fixed_bodies_is_an_error() {
        let mut world = World::new();
        let a = world.add_body(Body::fixed_block(
            Point2::origin(),
            Vector2::new(0.5, 0.5),
        ));
        let b = world.add_body(Body::fixed_block(
            Point2::new(1.0, 0.0),
            Vector2::new(0.5, 0.5),
        ));

        let mut event: CollisionEvent = impact_collision::PairwiseCollision::detect(
            a,
            b,
            &world,
            0.0,
            CollisionTolerance::default(),
        )
        .unwrap()
        .into();

        let engine = CollisionEngine::default();
        assert!(matches!(
            engine.apply_impulse(&mut event, &mut world),
            Err(ImpactError::NoFiniteMass { .. })
        ));
    }

    #[test]
    fn test_separating_contact_needs_no_impulse() {
        let mut world = World::new();
        world.add_body(Body::new(
            BodyState::new(Point2::origin(), Vector2::new(-1.0, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.5, 0.5),
        ));
        world.add_body(Body::new(
            BodyState::at_rest(Point2::new(1.004, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.5, 0.5),
        ));

        let engine = CollisionEngine::default();
        let report = engine.step(&mut world, 0.001).unwrap();

        assert_eq!(report.tracked, 1);
        assert!(report.handled.is_empty());
    }

    #[test]
    fn test_joint_with_zero_violation_never_gets_an_impulse() {
        let mut world = World::new();
        let a = world.add_body(Body::block(
            1.0,
            Point2::origin(),
            Vector2::new(0.1, 0.1),
        ));
        let b = world.add_body(Body::block(
            1.0,
            Point2::new(1.0, 0.0),
            Vector2::new(0.1, 0.1),
        ));
        world.add_connector(Box::new(
            PinJoint::new(a, b).with_anchors(Vector2::new(0.5, 0.0), Vector2::new(-0.5, 0.0)),
        ));

        let engine = CollisionEngine::default();
        for _ in 0..5 {
            let report = engine.step(&mut world, 0.01).unwrap();
            assert_eq!(report.tracked, 1);
            assert!(report.handled.is_empty());
            assert!(!report.residual_penetration);
        }
    }

    #[test]
    fn test_joint_zeroes_relative_velocity() {
        let mut world = World::new();
        let a = world.add_body(Body::block(
            1.0,
            Point2::origin(),
            Vector2::new(0.1, 0.1),
        ));
        let b = world.add_body(Body::new(
            BodyState::new(Point2::new(1.0, 0.0), Vector2::new(2.0, 0.0)),
            MassProperties::point_mass(1.0),
            Vector2::new(0.1, 0.1),
        ));
        world.add_connector(Box::new(
            PinJoint::new(a, b).with_anchors(Vector2::new(0.5, 0.0), Vector2::new(-0.5, 0.0)),
        ));

        let engine = CollisionEngine::default();
        let report = engine.step(&mut world, 0.01).unwrap();

        assert_eq!(report.handled.len(), 1);
        assert!(report.handled[0].bilateral);

        // The pull impulse evens out the velocities: momentum is shared
        // and the anchors stop drifting apart.
        let v_a = world.body(a).unwrap().state.velocity.x;
        let v_b = world.body(b).unwrap().state.velocity.x;
        assert_relative_eq!(v_a, 1.0, epsilon = 1e-9);
        assert_relative_eq!(v_b, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dedupe_keeps_the_more_overdue_event() {
        let mut world = World::new();
        let a = world.add_body(Body::block(
            1.0,
            Point2::origin(),
            Vector2::new(0.5, 0.5),
        ));
        let b = world.add_body(Body::block(
            1.0,
            Point2::new(1.1, 0.0),
            Vector2::new(0.5, 0.5),
        ));

        let shallow: CollisionEvent =
            PairwiseCollision::detect(a, b, &world, 0.0, CollisionTolerance::default())
                .unwrap()
                .into();

        // Same pair observed deeper in
        world.body_mut(b).unwrap().state.position.x = 0.95;
        let deep: CollisionEvent =
            PairwiseCollision::detect(b, a, &world, 0.0, CollisionTolerance::default())
                .unwrap()
                .into();
        let deep_distance = deep.distance();

        let mut events = vec![shallow, deep];
        dedupe_events(&mut events);

        assert_eq!(events.len(), 1);
        assert_relative_eq!(events[0].distance(), deep_distance, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_step_size() {
        let mut world = World::new();
        let engine = CollisionEngine::default();

        assert!(engine.step(&mut world, 0.0).is_err());
        assert!(engine.step(&mut world, -0.1).is_err());
        assert!(engine.step(&mut world, f64::NAN).is_err());
    }

    #[test]
    fn test_report_time_is_the_refined_event_time() {
        let (mut world, _, _) = closing_pair();
        let engine = CollisionEngine::default();

        let report = engine.step(&mut world, 0.004).unwrap();

        // The collision happened 2 ms into the 4 ms step; the step ends at
        // the refined time, inside the step window.
        assert!(report.time > 0.0 && report.time < 0.004);
        assert_relative_eq!(report.time, world.time(), epsilon = 1e-15);
    }
}
