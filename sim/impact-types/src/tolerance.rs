//! Distance tolerances for collision classification.
//!
//! Every collision variant classifies its current signed distance against
//! the same two tunables: the desired post-resolution separation
//! (`target_gap`) and a tolerance band around it (`accuracy`). Centralizing
//! the predicates here keeps the classification identical across variants.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The `target_gap`/`accuracy` band that classifies collision state.
///
/// Distance is signed: negative means penetration.
///
/// ```text
///   d < 0                    illegal (penetrating)
///   d < target_gap - accuracy    colliding, needs an impulse
///   |d - target_gap| <= accuracy resolved ("close enough")
///   d < 2 * target_gap           touching, keep tracking the pair
/// ```
///
/// # Example
///
/// ```
/// use impact_types::CollisionTolerance;
///
/// let tol = CollisionTolerance::default();
/// assert!(tol.close_enough(0.005, false));
/// assert!(tol.is_colliding(-0.001));
/// assert!(!tol.is_colliding(0.001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionTolerance {
    /// Desired separation distance after resolution (m).
    pub target_gap: f64,
    /// Tolerance band around `target_gap` within which a collision is
    /// considered resolved (m).
    pub accuracy: f64,
}

impl Default for CollisionTolerance {
    fn default() -> Self {
        Self {
            target_gap: 0.005,
            accuracy: 0.005,
        }
    }
}

impl CollisionTolerance {
    /// Create a tolerance with the given gap and accuracy.
    #[must_use]
    pub const fn new(target_gap: f64, accuracy: f64) -> Self {
        Self {
            target_gap,
            accuracy,
        }
    }

    /// True when the distance is within `accuracy` of `target_gap`.
    ///
    /// With `allow_tiny`, also accepts any small positive distance below
    /// `target_gap + accuracy`: barely separated but good enough to stop
    /// refining.
    #[must_use]
    pub fn close_enough(&self, distance: f64, allow_tiny: bool) -> bool {
        if allow_tiny {
            distance > 0.0 && distance < self.target_gap + self.accuracy
        } else {
            (distance - self.target_gap).abs() <= self.accuracy
        }
    }

    /// True when the body has penetrated beyond tolerance and needs an
    /// impulse.
    #[must_use]
    pub fn is_colliding(&self, distance: f64) -> bool {
        distance < self.target_gap - self.accuracy
    }

    /// Looser "nearby" predicate used to decide whether to keep tracking
    /// a pair at all.
    #[must_use]
    pub fn is_touching(&self, distance: f64) -> bool {
        distance < 2.0 * self.target_gap
    }

    /// True when the distance is physically invalid (penetrating).
    #[must_use]
    pub fn illegal(&self, distance: f64) -> bool {
        distance < 0.0
    }

    /// Validate the tolerance values.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.target_gap.is_finite() || self.target_gap <= 0.0 {
            return Err(crate::ImpactError::invalid_config(
                "target_gap must be positive and finite",
            ));
        }
        if !self.accuracy.is_finite() || self.accuracy <= 0.0 {
            return Err(crate::ImpactError::invalid_config(
                "accuracy must be positive and finite",
            ));
        }
        Ok(())
    }
}
