//! Error types for the collision subsystem.
//!
//! Only recoverable faults live here. Invariant violations (an absent
//! impact descriptor, a normal derivative on a flat contact, mutating a
//! list mid-iteration after the guard) are programmer errors and fail fast
//! with an assertion rather than an error variant.

use thiserror::Error;

/// Errors that can occur during collision handling.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImpactError {
    /// Invalid body ID referenced.
    #[error("unknown body ID: {0}")]
    UnknownBody(u64),

    /// Invalid connector ID referenced.
    #[error("unknown connector ID: {0}")]
    UnknownConnector(u64),

    /// Observer list mutated while a memorize pass was running.
    #[error("cannot {operation} while a memorize pass is in progress")]
    ObserverListBusy {
        /// The attempted operation ("add" or "remove").
        operation: &'static str,
    },

    /// Impulse requested between two fixed bodies.
    #[error("no finite mass between {body_a} and {body_b}: impulse is undefined")]
    NoFiniteMass {
        /// First participant.
        body_a: u64,
        /// Second participant.
        body_b: u64,
    },

    /// No initial state has been saved to reset to.
    #[error("no initial state saved")]
    InitialStateMissing,

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Simulation diverged (`NaN` or `Inf` detected).
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong.
        reason: String,
    },
}

impl ImpactError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Create a no-finite-mass error for a body pair.
    #[must_use]
    pub fn no_finite_mass(body_a: crate::BodyId, body_b: crate::BodyId) -> Self {
        Self::NoFiniteMass {
            body_a: body_a.raw(),
            body_b: body_b.raw(),
        }
    }

    /// Check if this is a divergence error.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this is the busy-observer-list error.
    #[must_use]
    pub fn is_observer_busy(&self) -> bool {
        matches!(self, Self::ObserverListBusy { .. })
    }
}
