//! Body state and mass types.
//!
//! The collision subsystem treats bodies as point masses with a rectangular
//! extent: a position, a linear velocity, a (possibly infinite) mass, and
//! half-extents that give the facing edge used for gap computation.

use hashbrown::HashMap;
use nalgebra::{Point2, Unit, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a body in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl BodyId {
    /// Create a new body ID.
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

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Position and velocity of a body.
///
/// # Example
///
/// ```
/// use impact_types::BodyState;
/// use nalgebra::{Point2, Vector2};
///
/// let state = BodyState::new(Point2::new(1.0, 0.0), Vector2::new(-0.5, 0.0));
/// assert_eq!(state.position.x, 1.0);
/// assert_eq!(state.velocity.x, -0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyState {
    /// Position in world coordinates (m).
    pub position: Point2<f64>,
    /// Linear velocity in world coordinates (m/s).
    pub velocity: Vector2<f64>,
}

impl Default for BodyState {
    fn default() -> Self {
        Self::at_rest(Point2::origin())
    }
}

impl BodyState {
    /// Create a state from position and velocity.
    #[must_use]
    pub const fn new(position: Point2<f64>, velocity: Vector2<f64>) -> Self {
        Self { position, velocity }
    }

    /// Create a state at rest at the given position.
    #[must_use]
    pub fn at_rest(position: Point2<f64>) -> Self {
        Self {
            position,
            velocity: Vector2::zeros(),
        }
    }

    /// Position after coasting for `dt` seconds at constant velocity.
    ///
    /// Used by collision-time refinement to evaluate candidate times inside
    /// a step without committing state.
    #[must_use]
    pub fn coasted(&self, dt: f64) -> Self {
        Self {
            position: self.position + self.velocity * dt,
            velocity: self.velocity,
        }
    }

    /// Check if the state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.velocity.iter().all(|x| x.is_finite())
    }
}

/// Mass properties of a body.
///
/// A mass of `f64::INFINITY` marks a fixed (immovable) body. Fixed bodies
/// have zero inverse mass, so the impulse math degenerates cleanly to a
/// one-sided velocity change instead of a division fault.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg. `f64::INFINITY` for fixed bodies.
    pub mass: f64,
}

impl MassProperties {
    /// Create mass properties for a movable point mass.
    #[must_use]
    pub const fn point_mass(mass: f64) -> Self {
        Self { mass }
    }

    /// Create mass properties for a fixed (immovable) body.
    #[must_use]
    pub const fn fixed() -> Self {
        Self {
            mass: f64::INFINITY,
        }
    }

    /// Get the inverse mass (0 for fixed bodies).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass <= 0.0 || self.mass.is_infinite() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Check if this represents a fixed (immovable) body.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.mass.is_infinite()
    }

    /// Validate that the mass is physically meaningful.
    pub fn validate(&self) -> crate::Result<()> {
        if self.mass.is_nan() || self.mass <= 0.0 {
            return Err(crate::ImpactError::invalid_config(
                "mass must be positive (use infinity for fixed bodies)",
            ));
        }
        Ok(())
    }
}

/// A movable body: state, mass, and a rectangular extent.
///
/// The half-extents give the body's facing edges. The gap between two
/// bodies along a collision axis is the distance between their centers
/// projected on the axis, minus both bodies' support extents.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    /// Position and velocity.
    pub state: BodyState,
    /// Mass properties.
    pub mass: MassProperties,
    /// Half-extents of the body's rectangular footprint (m).
    pub half_extents: Vector2<f64>,
}

impl Body {
    /// Create a body from state, mass, and half-extents.
    #[must_use]
    pub const fn new(state: BodyState, mass: MassProperties, half_extents: Vector2<f64>) -> Self {
        Self {
            state,
            mass,
            half_extents,
        }
    }

    /// Create a movable block at rest.
    #[must_use]
    pub fn block(mass: f64, position: Point2<f64>, half_extents: Vector2<f64>) -> Self {
        Self {
            state: BodyState::at_rest(position),
            mass: MassProperties::point_mass(mass),
            half_extents,
        }
    }

    /// Create a fixed (immovable) block.
    #[must_use]
    pub fn fixed_block(position: Point2<f64>, half_extents: Vector2<f64>) -> Self {
        Self {
            state: BodyState::at_rest(position),
            mass: MassProperties::fixed(),
            half_extents,
        }
    }

    /// Support extent along a unit axis: how far the body's footprint
    /// reaches from its center when projected on the axis.
    #[must_use]
    pub fn extent_along(&self, axis: &Unit<Vector2<f64>>) -> f64 {
        self.half_extents.x * axis.x.abs() + self.half_extents.y * axis.y.abs()
    }

    /// Check if the body state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.state.is_finite()
    }
}

/// Read access to bodies by ID.
///
/// Collision events reference their participants through [`BodyId`] handles
/// and resolve them through this trait when recomputing geometry. The
/// engine's world implements it against committed state; the refinement
/// phase implements it against state coasted to a candidate time.
pub trait BodyLookup {
    /// Snapshot of the body with the given ID.
    fn body(&self, id: BodyId) -> crate::Result<Body>;
}

impl BodyLookup for HashMap<BodyId, Body> {
    fn body(&self, id: BodyId) -> crate::Result<Body> {
        self.get(&id)
            .copied()
            .ok_or(crate::ImpactError::UnknownBody(id.raw()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_body_id() {
        let id = BodyId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "Body(42)");

        let id2: BodyId = 42.into();
        assert_eq!(id, id2);
    }

    #[test]
    fn test_coasted_state() {
        let state = BodyState::new(Point2::new(1.0, 0.0), Vector2::new(2.0, 0.0));
        let later = state.coasted(0.5);
        assert_relative_eq!(later.position.x, 2.0, epsilon = 1e-12);
        // Coasting backward rewinds the position
        let earlier = state.coasted(-0.5);
        assert_relative_eq!(earlier.position.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_mass() {
        assert_relative_eq!(
            MassProperties::point_mass(4.0).inverse_mass(),
            0.25,
            epsilon = 1e-12
        );
        assert_eq!(MassProperties::fixed().inverse_mass(), 0.0);
        assert!(MassProperties::fixed().is_fixed());
        assert!(!MassProperties::point_mass(1.0).is_fixed());
    }

    #[test]
    fn test_mass_validation() {
        assert!(MassProperties::point_mass(1.0).validate().is_ok());
        assert!(MassProperties::fixed().validate().is_ok());
        assert!(MassProperties::point_mass(0.0).validate().is_err());
        assert!(MassProperties::point_mass(-1.0).validate().is_err());
        assert!(MassProperties::point_mass(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_extent_along() {
        let body = Body::block(1.0, Point2::origin(), Vector2::new(0.5, 0.25));

        assert_relative_eq!(body.extent_along(&Vector2::x_axis()), 0.5, epsilon = 1e-12);
        assert_relative_eq!(body.extent_along(&Vector2::y_axis()), 0.25, epsilon = 1e-12);
        // Negated axis projects the same footprint
        let neg_x = Unit::new_normalize(Vector2::new(-1.0, 0.0));
        assert_relative_eq!(body.extent_along(&neg_x), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_body_lookup_on_map() {
        let mut bodies = HashMap::new();
        bodies.insert(
            BodyId::new(0),
            Body::block(1.0, Point2::origin(), Vector2::new(0.5, 0.5)),
        );

        assert!(bodies.body(BodyId::new(0)).is_ok());
        assert!(matches!(
            bodies.body(BodyId::new(9)),
            Err(crate::ImpactError::UnknownBody(9))
        ));
    }

    #[test]
    fn test_is_finite() {
        let mut body = Body::block(1.0, Point2::origin(), Vector2::new(0.5, 0.5));
        assert!(body.is_finite());

        body.state.velocity.x = f64::NAN;
        assert!(!body.is_finite());
    }
}
