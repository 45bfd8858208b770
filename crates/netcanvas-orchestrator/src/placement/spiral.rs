//! Overlap avoidance by golden-angle spiral search.

use netcanvas_abstraction::Position;
use std::f64::consts::TAU;

/// Fraction of a full turn added per attempt.
const GOLDEN_FRACTION: f64 = 0.618_033_988_75;

/// Snaps a point to the nearest grid intersection.
pub fn snap_to_grid(point: Position, grid: f64) -> Position {
    if grid <= 0.0 {
        return point;
    }
    Position::new((point.x / grid).round() * grid, (point.y / grid).round() * grid)
}

/// Whether `point` keeps at least `min_spacing` from every occupied point.
pub fn is_clear(point: Position, occupied: &[Position], min_spacing: f64) -> bool {
    occupied.iter().all(|o| o.distance_to(&point) >= min_spacing)
}

/// Outcome of [`avoid_overlap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpiralOutcome {
    pub position: Position,
    /// Attempts used; zero when the candidate was already clear.
    pub attempts: u32,
    /// False when the attempts ran out and the candidate was returned as is.
    pub resolved: bool,
}

/// Searches outward from `candidate` for a collision-free grid point.
///
/// Attempt `n` looks at angle `n * 0.618 * 2π` and radius `√n * grid`. When
/// no attempt is clear the candidate is returned unchanged.
pub fn avoid_overlap(
    candidate: Position,
    occupied: &[Position],
    grid: f64,
    min_spacing: f64,
    max_attempts: u32,
) -> SpiralOutcome {
    if is_clear(candidate, occupied, min_spacing) {
        return SpiralOutcome { position: candidate, attempts: 0, resolved: true };
    }

    for attempt in 1..=max_attempts {
        let n = f64::from(attempt);
        let angle = n * GOLDEN_FRACTION * TAU;
        let radius = n.sqrt() * grid;
        let probe = snap_to_grid(
            Position::new(candidate.x + radius * angle.cos(), candidate.y + radius * angle.sin()),
            grid,
        );
        if is_clear(probe, occupied, min_spacing) {
            return SpiralOutcome { position: probe, attempts: attempt, resolved: true };
        }
    }

    SpiralOutcome { position: candidate, attempts: max_attempts, resolved: false }
}
