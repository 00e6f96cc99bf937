//! Configuration for the collision engine.

use crate::CollisionTolerance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for collision detection, refinement, and resolution.
///
/// # Example
///
/// ```
/// use impact_types::EngineConfig;
///
/// let config = EngineConfig::default().with_restitution(0.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Distance tolerances for collision classification.
    pub tolerance: CollisionTolerance,

    /// Coefficient of restitution for unilateral contacts.
    ///
    /// 1.0 = perfectly elastic, 0.0 = perfectly inelastic. Bilateral
    /// constraints ignore this and drive relative velocity to zero.
    pub restitution: f64,

    /// Minimum bracket width for collision-time bisection (s).
    ///
    /// When the bracket narrows below this without the distance entering
    /// the resolved band, refinement stops and proceeds with its best
    /// estimate.
    pub min_bracket_width: f64,

    /// Hard bound on bisection iterations.
    ///
    /// A backstop above the `log2(width / min_width)` iterations bisection
    /// naturally needs.
    pub max_refine_iterations: usize,

    /// Maximum impulse-application passes per step.
    ///
    /// Residual penetration after a pass forces another; penetration that
    /// survives this many passes is surfaced as a health warning.
    pub max_resolution_passes: usize,

    /// Relative speed below which a constraint is considered at rest (m/s).
    pub resting_velocity: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: CollisionTolerance::default(),
            restitution: 1.0,
            min_bracket_width: 1e-7,
            max_refine_iterations: 60,
            max_resolution_passes: 4,
            resting_velocity: 1e-6,
        }
    }
}

impl EngineConfig {
    /// Create a config with the given tolerance.
    #[must_use]
    pub fn with_tolerance(tolerance: CollisionTolerance) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    /// Set the coefficient of restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set the bisection termination bounds.
    #[must_use]
    pub fn with_refinement(mut self, min_bracket_width: f64, max_iterations: usize) -> Self {
        self.min_bracket_width = min_bracket_width;
        self.max_refine_iterations = max_iterations;
        self
    }

    /// Set the resolution retry bound.
    #[must_use]
    pub fn with_resolution_passes(mut self, passes: usize) -> Self {
        self.max_resolution_passes = passes;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        self.tolerance.validate()?;

        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(crate::ImpactError::invalid_config(
                "restitution must be between 0 and 1",
            ));
        }
        if !self.min_bracket_width.is_finite() || self.min_bracket_width <= 0.0 {
            return Err(crate::ImpactError::invalid_config(
                "min_bracket_width must be positive and finite",
            ));
        }
        if self.max_refine_iterations == 0 {
            return Err(crate::ImpactError::invalid_config(
                "max_refine_iterations must be at least 1",
            ));
        }
        if self.max_resolution_passes == 0 {
            return Err(crate::ImpactError::invalid_config(
                "max_resolution_passes must be at least 1",
            ));
        }
        if self.resting_velocity < 0.0 {
            return Err(crate::ImpactError::invalid_config(
                "resting_velocity cannot be negative",
            ));
        }

        Ok(())
    }
}
