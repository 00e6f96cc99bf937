//! Core types for impulse-based collision simulation.
//!
//! This crate provides the foundational types for the collision/constraint
//! subsystem:
//!
//! - [`Body`] - A movable point mass or simple rigid body in the plane
//! - [`CollisionTolerance`] - The `target_gap`/`accuracy` band that classifies
//!   collision state
//! - [`EngineConfig`] - Restitution, bisection bounds, retry limits
//! - [`ImpactError`] - Error taxonomy for recoverable faults
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no collision detection, no
//! refinement, no impulse math. They're the common language between:
//!
//! - Collision-event variants (pairwise contacts, rigid-body contacts, joints)
//! - The resolution engine (detection, time refinement, impulse application)
//! - Diagnostics and replay (serialized step reports)
//!
//! # Coordinate System
//!
//! The simulation is planar:
//!
//! - X: right
//! - Y: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use impact_types::{Body, BodyState, MassProperties};
//! use nalgebra::{Point2, Vector2};
//!
//! // A unit-mass block at the origin, half a meter wide
//! let body = Body::new(
//!     BodyState::at_rest(Point2::origin()),
//!     MassProperties::point_mass(1.0),
//!     Vector2::new(0.25, 0.25),
//! );
//!
//! assert!((body.mass.inverse_mass() - 1.0).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/impact-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,       // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod tolerance;

pub use body::{Body, BodyId, BodyLookup, BodyState, MassProperties};
pub use config::EngineConfig;
pub use error::ImpactError;
pub use tolerance::CollisionTolerance;

// Re-export math types for convenience
pub use nalgebra::{Point2, Unit, Vector2};

/// Result type for collision-subsystem operations.
pub type Result<T> = std::result::Result<T, ImpactError>;
