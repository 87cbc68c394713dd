/// The integrate function: advances one body by one tick.
///
/// Processing order:
///   1. Sanitise non-finite state
///   2. Gravity (capped) and input → dx, dy
///   3. Horizontal: walls, then legacy solid tiles
///   4. Vertical: floors → slope sprites → legacy solid tiles
///   5. Bounds: patrol leash, map edges
///
/// Line terrain is authoritative. Slope sprites only hold a body no floor
/// holds; solid tiles only act on maps without any line segment.

use crate::config::SimConfig;
use crate::domain::body::KinematicBody;
use crate::domain::terrain::TerrainModel;
use super::bounds::clamp_bounds;
use super::event::MotionEvent;
use super::fallback::{resolve_slope, resolve_solid_horizontal, resolve_solid_vertical};
use super::horizontal::resolve_horizontal;
use super::vertical::{resolve_vertical, VerticalOutcome};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Advance `body` by one tick. `dx` is the walking displacement for this
/// tick (normally [`KinematicBody::intended_dx`]); `vx` is added on top.
pub fn integrate(
    terrain: &TerrainModel,
    cfg: &SimConfig,
    body: &mut KinematicBody,
    dx: f32,
    gravity: f32,
) -> Vec<MotionEvent> {
    let mut events = Vec::new();
    sanitize(body);
    let dx = finite_or_zero(dx);
    let gravity = finite_or_zero(gravity);
    let legacy_tiles = !terrain.has_lines();

    let was_grounded = body.grounded;
    if was_grounded {
        body.vx = 0.0;
    }
    body.vy = (body.vy + gravity).min(cfg.motion.max_fall_speed);

    // ── Horizontal ──
    let start_x = body.rect.x;
    let dx = dx + body.vx;
    resolve_horizontal(terrain, cfg, body, dx, &mut events);
    if legacy_tiles {
        resolve_solid_horizontal(terrain, body, dx);
    }
    let moved_x = body.rect.x - start_x;

    // ── Vertical ──
    let dy = body.vy;
    body.rect.translate(0.0, dy);
    match resolve_vertical(terrain, cfg, body, moved_x, dy, &mut events) {
        VerticalOutcome::Supported(_) => {}
        VerticalOutcome::Ascending => {
            if legacy_tiles {
                resolve_solid_vertical(terrain, body, &mut events);
            }
        }
        VerticalOutcome::NoSupport => {
            let held = resolve_slope(terrain, cfg, body, &mut events)
                || (legacy_tiles && resolve_solid_vertical(terrain, body, &mut events));
            if !held {
                body.grounded = false;
                body.current_line_id = None;
            }
        }
    }

    // ── Bounds ──
    clamp_bounds(terrain, body, &mut events);

    if was_grounded && !body.grounded {
        events.push(MotionEvent::LeftGround);
    }
    events
}

/// Pure form of [`integrate`]: returns the advanced body, leaves `body` alone.
pub fn integrated(
    terrain: &TerrainModel,
    cfg: &SimConfig,
    body: &KinematicBody,
    dx: f32,
    gravity: f32,
) -> KinematicBody {
    let mut next = body.clone();
    integrate(terrain, cfg, &mut next, dx, gravity);
    next
}

// ══════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn sanitize(body: &mut KinematicBody) {
    let r = &mut body.rect;
    r.x = finite_or_zero(r.x);
    r.y = finite_or_zero(r.y);
    r.w = finite_or_zero(r.w).max(0.0);
    r.h = finite_or_zero(r.h).max(0.0);
    body.vx = finite_or_zero(body.vx);
    body.vy = finite_or_zero(body.vy);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
