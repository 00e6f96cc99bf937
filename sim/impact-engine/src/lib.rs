//! Collision detection, time refinement, and impulse resolution.
//!
//! This crate provides the resolution driver for the collision subsystem.
//! It builds on [`impact_types`] for the data structures and
//! [`impact_collision`] for the event taxonomy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CollisionEngine                           │
//! │  Orchestrates: collect → refine → dedup → resolve → verify  │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         World                                │
//! │  Contains: bodies, connectors, time, saved initial state    │
//! │  Provides: entity management, coasting, candidate-time view │
//! └─────────────────────────┬───────────────────────────────────┘
//! ```
//!
//! # Step Model
//!
//! The entire cycle for one step runs to completion before the next step
//! begins; no operation suspends mid-step. Detection and refinement read
//! body state but never mutate it; velocities change only while the engine
//! applies impulses. Every loop is bounded: bisection terminates at a
//! minimum bracket width, and residual penetration retries up to a
//! configured pass count before being surfaced as a health warning.
//!
//! # Quick Start
//!
//! ```
//! use impact_engine::{CollisionEngine, World};
//! use impact_types::{Body, BodyState, EngineConfig, MassProperties};
//! use nalgebra::{Point2, Vector2};
//!
//! let mut world = World::new();
//! let left = world.add_body(Body::new(
//!     BodyState::new(Point2::origin(), Vector2::new(1.0, 0.0)),
//!     MassProperties::point_mass(1.0),
//!     Vector2::new(0.5, 0.5),
//! ));
//! let right = world.add_body(Body::new(
//!     BodyState::at_rest(Point2::new(1.102, 0.0)),
//!     MassProperties::point_mass(1.0),
//!     Vector2::new(0.6, 0.5),
//! ));
//! world.save_initial_state();
//!
//! let engine = CollisionEngine::new(EngineConfig::default());
//! let report = engine.step(&mut world, 0.004).unwrap();
//!
//! // The elastic bounce between equal masses swapped the velocities.
//! assert_eq!(report.handled.len(), 1);
//! assert!(world.body(right).unwrap().state.velocity.x > 0.99);
//! assert!(world.body(left).unwrap().state.velocity.x.abs() < 1e-9);
//!
//! // And the scene can be restored to where it started.
//! world.reset().unwrap();
//! assert_eq!(world.time(), 0.0);
//! ```
//!
//! # Observers
//!
//! Side-effecting hooks register once on a [`MemoList`] and run once per
//! completed step, after resolution. Mutating the list while a pass is in
//! progress is refused with a recoverable error.

#![doc(html_root_url = "https://docs.rs/impact-engine/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn, clippy::missing_errors_doc)]

mod engine;
mod memo;
mod refine;
mod world;

pub use engine::{dedupe_events, CollisionEngine, HandledCollision, StepReport};
pub use memo::{MemoId, MemoList, Memorizable};
pub use refine::{refine_collision_time, Bracket, RefineOutcome};
pub use world::{StateAt, World};

// Re-export the vocabulary this crate is used with
pub use impact_collision::{Collision, CollisionEvent, Connector, ConnectorId, PinJoint};
pub use impact_types::{Body, BodyId, CollisionTolerance, EngineConfig, ImpactError, Result};
