//! Bisection refinement of collision event times.
//!
//! When the integrator detects that a collision's distance crossed from
//! non-negative to negative between the last safe time and the current
//! one, the exact event time is bracketed and bisected: a midpoint whose
//! distance is still illegal tightens the upper bound, a midpoint that is
//! non-negative but not yet close enough tightens the lower bound. The
//! search stops as soon as the distance enters the resolved band, or when
//! the bracket collapses below the configured minimum width, in which case
//! the best estimate is kept and a diagnostic is emitted. Both exits are
//! bounded; refinement can never loop forever.

use impact_collision::{Collision, CollisionEvent, UpdateContext};
use impact_types::{EngineConfig, Result};

use crate::world::World;

/// A time interval known to contain a collision event.
///
/// `lower` is the last time the state was known to be safe; `upper` is the
/// candidate (possibly penetrating) time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    /// Last known safe time.
    pub lower: f64,
    /// Candidate (possibly invalid) time.
    pub upper: f64,
}

impl Bracket {
    /// Create a bracket from a safe time and a candidate time.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Width of the bracket.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Result of refining one collision's event time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineOutcome {
    /// Best estimate of the event time.
    pub time: f64,
    /// Whether the distance reached the resolved band. When false, the
    /// step proceeds with the best estimate anyway.
    pub converged: bool,
    /// Number of bisection iterations performed.
    pub iterations: usize,
}

/// Narrow a bracketed collision toward the earliest time at which its
/// distance is close enough to the target gap.
///
/// The event's distance is re-evaluated at each midpoint against the world
/// coasted to that time; committed state is never touched. On return the
/// event has been updated at the outcome time.
pub fn refine_collision_time(
    event: &mut CollisionEvent,
    world: &World,
    bracket: Bracket,
    config: &EngineConfig,
) -> Result<RefineOutcome> {
    let mut lower = bracket.lower;
    let mut upper = bracket.upper;

    let evaluate = |event: &mut CollisionEvent, time: f64| -> Result<()> {
        let view = world.state_at(time);
        let ctx = UpdateContext::new(&view, world);
        event.update_collision(&ctx, time)
    };

    evaluate(event, upper)?;
    if event.close_enough(false) {
        return Ok(RefineOutcome {
            time: upper,
            converged: true,
            iterations: 0,
        });
    }

    let mut iterations = 0;
    while iterations < config.max_refine_iterations
        && (upper - lower) > config.min_bracket_width
    {
        iterations += 1;
        let mid = 0.5 * (lower + upper);
        evaluate(event, mid)?;

        if event.close_enough(false) {
            return Ok(RefineOutcome {
                time: mid,
                converged: true,
                iterations,
            });
        }
        if event.illegal_state() {
            upper = mid;
        } else {
            lower = mid;
        }
    }

    // Bracket collapsed without entering the band. Settle on the last
    // known non-penetrating time and let the step proceed.
    evaluate(event, lower)?;
    tracing::warn!(
        lower,
        upper,
        iterations,
        "collision time unresolved to full accuracy"
    );
    Ok(RefineOutcome {
        time: lower,
        converged: false,
        iterations,
    })
}
