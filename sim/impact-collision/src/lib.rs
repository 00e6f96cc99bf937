//! Collision-event taxonomy for impulse-based simulation.
//!
//! This crate provides the collision events the resolution engine works on:
//!
//! - [`Collision`] - The capability set every event variant satisfies:
//!   signed distance, tolerance classification, bilateral/unilateral,
//!   impulse bookkeeping
//! - [`PairwiseCollision`] - A simple-geometry collision between two bodies
//!   along one axis
//! - [`RigidBodyCollision`] - Full contact geometry: contact point, unit
//!   normal, curvature data, impact descriptors
//! - [`ConnectorCollision`] - A collision generated by a standing
//!   [`Connector`] constraint, always bilateral
//! - [`PinJoint`] - A concrete connector pinning two bodies together at
//!   anchor points
//!
//! # Taxonomy
//!
//! A **contact** is unilateral: bodies may only push apart. A **joint** is
//! bilateral: the constraint may both push and pull to maintain a geometric
//! relation. Both are resolved through the same [`Collision`] capability
//! set, so the engine has exactly one impulse-application code path.
//!
//! Events are owned by the engine's per-step working set as
//! [`CollisionEvent`] values; connectors persist in the scene and hand the
//! engine a refreshed [`ConnectorCollision`] each step.
//!
//! # Example
//!
//! ```
//! use impact_collision::{Collision, PairwiseCollision, UpdateContext};
//! use impact_types::{Body, BodyId, BodyLookup, CollisionTolerance};
//! use hashbrown::HashMap;
//! use nalgebra::{Point2, Vector2};
//!
//! let mut bodies = HashMap::new();
//! bodies.insert(
//!     BodyId::new(0),
//!     Body::block(1.0, Point2::new(0.0, 0.0), Vector2::new(0.5, 0.5)),
//! );
//! bodies.insert(
//!     BodyId::new(1),
//!     Body::block(1.0, Point2::new(1.2, 0.0), Vector2::new(0.5, 0.5)),
//! );
//!
//! let collision = PairwiseCollision::detect(
//!     BodyId::new(0),
//!     BodyId::new(1),
//!     &bodies,
//!     0.0,
//!     CollisionTolerance::default(),
//! ).unwrap();
//!
//! // Gap: 1.2 between centers, minus 0.5 half-width each side
//! assert!((collision.distance() - 0.2).abs() < 1e-12);
//! assert!(!collision.is_colliding());
//! assert!(collision.impulse().is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/impact-collision/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod connector;
mod event;
mod pairwise;
mod rigid;

pub use connector::{
    Connector, ConnectorCollision, ConnectorId, ConnectorLookup, ConnectorSet, PinJoint,
};
pub use event::{Collision, CollisionEvent, UpdateContext};
pub use pairwise::PairwiseCollision;
pub use rigid::RigidBodyCollision;

// Re-export the types this crate speaks in
pub use impact_types::{Body, BodyId, BodyLookup, CollisionTolerance, ImpactError, Result};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use impact_types::BodyState;
    use nalgebra::{Point2, Vector2};

    fn two_blocks(gap: f64) -> HashMap<BodyId, Body> {
        let mut bodies = HashMap::new();
        bodies.insert(
            BodyId::new(0),
            Body::block(1.0, Point2::origin(), Vector2::new(0.5, 0.5)),
        );
        bodies.insert(
            BodyId::new(1),
            Body::block(1.0, Point2::new(1.0 + gap, 0.0), Vector2::new(0.5, 0.5)),
        );
        bodies
    }

    #[test]
    fn test_pairwise_and_connector_similarity_across_variants() {
        let bodies = two_blocks(0.1);
        let tol = CollisionTolerance::default();

        let a = PairwiseCollision::detect(BodyId::new(0), BodyId::new(1), &bodies, 0.0, tol)
            .unwrap();
        let b = PairwiseCollision::detect(BodyId::new(1), BodyId::new(0), &bodies, 0.0, tol)
            .unwrap();

        let a: CollisionEvent = a.into();
        let b: CollisionEvent = b.into();
        // Same unordered pair: always similar
        assert!(a.similar_to(&b));
        assert!(b.similar_to(&a));

        // A connector collision is never similar to anything
        let mut set = ConnectorSet::new();
        let joint = PinJoint::new(BodyId::new(0), BodyId::new(1));
        let id = set.add(Box::new(joint));
        let c: CollisionEvent =
            ConnectorCollision::create(id, set.connector(id).unwrap(), &bodies, 0.0, tol)
                .unwrap()
                .into();
        assert!(!c.similar_to(&a));
        assert!(!a.similar_to(&c));
        assert!(!c.similar_to(&c.clone()));
    }

    #[test]
    fn test_velocity_sign_convention() {
        let mut bodies = two_blocks(0.5);
        // Right body moving away at +1 in x: separating, positive velocity
        bodies.get_mut(&BodyId::new(1)).unwrap().state =
            BodyState::new(Point2::new(1.5, 0.0), Vector2::new(1.0, 0.0));

        let c = PairwiseCollision::detect(
            BodyId::new(0),
            BodyId::new(1),
            &bodies,
            0.0,
            CollisionTolerance::default(),
        )
        .unwrap();

        assert!(c.velocity(&bodies).unwrap() > 0.0);
    }
}
