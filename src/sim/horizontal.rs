/// Horizontal resolution against wall segments.
///
/// ## Order of checks per wall
///
/// ┌──────────────────────────────────────┬──────────────┐
/// │ Condition                             │ Result       │
/// ├──────────────────────────────────────┼──────────────┤
/// │ no vertical overlap with the rect     │ skip         │
/// │ body stands on it                     │ skip         │
/// │ top junction joins a floor extending  │ skip (cliff) │
/// │   away from the travel direction      │              │
/// │ leading edge crossed it this tick     │ CLAMP        │
/// │ otherwise                             │ pass         │
/// └──────────────────────────────────────┴──────────────┘
///
/// Floors are never barriers here; steep ground is authored as walls.

use crate::config::SimConfig;
use crate::domain::body::KinematicBody;
use crate::domain::geometry::Rect;
use crate::domain::terrain::{LineSegment, SegmentId, TerrainModel};
use super::event::MotionEvent;
use super::probe::foot_probes;

/// Slack for "was the edge already touching the wall last tick".
const CONTACT_EPSILON: f32 = 0.01;

/// How far above the feet a surface may sit and still count as stood on.
const STANDING_SLACK: f32 = 2.0;

/// Translate the body by `dx`, then clamp its leading edge against walls.
/// Returns the wall that stopped it, if any.
pub fn resolve_horizontal(
    terrain: &TerrainModel,
    cfg: &SimConfig,
    body: &mut KinematicBody,
    dx: f32,
    events: &mut Vec<MotionEvent>,
) -> Option<SegmentId> {
    if dx == 0.0 {
        return None;
    }

    let prev = body.rect;
    body.rect.translate(dx, 0.0);

    let mut blocker = None;
    for wall in terrain.walls() {
        if !overlaps_vertically(wall, &body.rect) {
            continue;
        }
        if is_standing_on(wall, &prev, body.current_line_id, cfg) {
            continue;
        }
        if is_cliff_edge(terrain, wall, dx) {
            log::debug!("wall {} ignored: ledge edge", wall.id);
            events.push(MotionEvent::CliffIgnored { segment: wall.id });
            continue;
        }

        let contact = if wall.is_vertical() {
            vertical_contact(wall, &prev, &body.rect, dx)
        } else {
            diagonal_contact(wall, &prev, &body.rect, dx)
        };

        if let Some(x) = contact {
            if dx > 0.0 {
                body.rect.set_right(x);
            } else {
                body.rect.set_left(x);
            }
            blocker = Some(wall.id);
        }
    }

    if let Some(id) = blocker {
        let x = if dx > 0.0 { body.rect.right() } else { body.rect.left() };
        log::debug!("wall {id} blocks at x={x}");
        body.vx = 0.0;
        events.push(MotionEvent::WallContact { segment: id, x });
    }
    blocker
}

/// Strict overlap: a wall ending exactly at the feet does not block.
fn overlaps_vertically(wall: &LineSegment, rect: &Rect) -> bool {
    wall.min_y() < rect.bottom() && wall.max_y() > rect.top()
}

/// Standing-surface override: a segment that was already under the feet
/// before this tick's move is ground, not a wall, however steep it is.
/// Surfaces above the feet never qualify.
fn is_standing_on(
    seg: &LineSegment,
    prev: &Rect,
    current: Option<SegmentId>,
    cfg: &SimConfig,
) -> bool {
    if current == Some(seg.id) {
        return true;
    }
    if seg.is_vertical() {
        return false;
    }
    let reach = cfg.step.max_slope_step_down + 5.0;
    foot_probes(prev, &cfg.probe).iter().any(|&x| {
        if !seg.contains_x(x) {
            return false;
        }
        let gap = seg.y_at(x) - prev.bottom();
        gap >= -STANDING_SLACK && gap <= reach
    })
}

/// Is this wall the face below a ledge the body is walking off?
///
/// True when the junction at the wall's top holds a floor whose other end
/// lies behind the body (opposite `dx`).
fn is_cliff_edge(terrain: &TerrainModel, wall: &LineSegment, dx: f32) -> bool {
    let graph = terrain.graph();
    let top = wall.top_end();
    let Some(junction) = graph.junction_of(wall.id, top).filter(|j| j.is_shared()) else {
        return false;
    };
    let jx = junction.centroid.x;

    graph.neighbours_at(wall.id, top).any(|(id, end)| {
        let Some(floor) = terrain.segment(id).filter(|s| s.is_floor()) else {
            return false;
        };
        let far = floor.endpoint(end.other());
        if dx > 0.0 { far.x < jx } else { far.x > jx }
    })
}

/// Near-vertical wall: the leading edge crossed `wall_x` this tick.
fn vertical_contact(wall: &LineSegment, prev: &Rect, rect: &Rect, dx: f32) -> Option<f32> {
    let wall_x = (wall.p1.x + wall.p2.x) / 2.0;
    if dx > 0.0 {
        (prev.right() <= wall_x + CONTACT_EPSILON && rect.right() > wall_x).then_some(wall_x)
    } else {
        (prev.left() >= wall_x - CONTACT_EPSILON && rect.left() < wall_x).then_some(wall_x)
    }
}

/// Diagonal wall: nearest point of the wall inside the rect's vertical span
/// that lies ahead of the previous leading edge.
fn diagonal_contact(wall: &LineSegment, prev: &Rect, rect: &Rect, dx: f32) -> Option<f32> {
    let mut candidates: Vec<f32> = [wall.x_at(rect.top()), wall.x_at(rect.bottom())]
        .into_iter()
        .flatten()
        .collect();
    for p in [wall.p1, wall.p2] {
        if p.y > rect.top() && p.y < rect.bottom() {
            candidates.push(p.x);
        }
    }

    if dx > 0.0 {
        let edge = prev.right() - CONTACT_EPSILON;
        let contact = candidates.into_iter().filter(|&x| x >= edge).reduce(f32::min)?;
        (rect.right() > contact).then_some(contact)
    } else {
        let edge = prev.left() + CONTACT_EPSILON;
        let contact = candidates.into_iter().filter(|&x| x <= edge).reduce(f32::max)?;
        (rect.left() < contact).then_some(contact)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::body::KinematicBody;
    use crate::domain::terrain::{build_terrain, LineDef};

    fn terrain(lines: &[LineDef]) -> TerrainModel {
        build_terrain(lines, &[], &[], None, 5.0)
    }

    /// 50×80 body with its right edge at `right`, feet at `bottom`.
    fn body_right_at(right: f32, bottom: f32) -> KinematicBody {
        KinematicBody::new(right - 25.0, bottom, 50.0, 80.0, 5.0)
    }

    #[test]
    fn vertical_wall_clamps_right_edge() {
        let t = terrain(&[LineDef::wall((300.0, 400.0), (300.0, 500.0))]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(295.0, 500.0);
        let mut ev = Vec::new();

        let hit = resolve_horizontal(&t, &cfg, &mut b, 10.0, &mut ev);
        assert_eq!(hit, Some(SegmentId(0)));
        assert_eq!(b.rect.right(), 300.0);
        assert!(ev.contains(&MotionEvent::WallContact { segment: SegmentId(0), x: 300.0 }));

        // Pressing on: still pinned, nothing carried over.
        for _ in 0..3 {
            resolve_horizontal(&t, &cfg, &mut b, 10.0, &mut ev);
            assert_eq!(b.rect.right(), 300.0);
        }
    }

    #[test]
    fn vertical_wall_clamps_left_edge() {
        let t = terrain(&[LineDef::wall((300.0, 400.0), (300.0, 500.0))]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(355.0, 500.0); // left = 305
        resolve_horizontal(&t, &cfg, &mut b, -10.0, &mut Vec::new());
        assert_eq!(b.rect.left(), 300.0);
    }

    #[test]
    fn moving_away_from_wall_is_free() {
        let t = terrain(&[LineDef::wall((300.0, 400.0), (300.0, 500.0))]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(300.0, 500.0);
        let hit = resolve_horizontal(&t, &cfg, &mut b, -5.0, &mut Vec::new());
        assert!(hit.is_none());
        assert_eq!(b.rect.right(), 295.0);
    }

    #[test]
    fn wall_above_head_does_not_block() {
        let t = terrain(&[LineDef::wall((300.0, 100.0), (300.0, 300.0))]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(295.0, 500.0);
        assert!(resolve_horizontal(&t, &cfg, &mut b, 10.0, &mut Vec::new()).is_none());
        assert_eq!(b.rect.right(), 305.0);
    }

    #[test]
    fn no_walls_leaves_dx_untouched() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (1000.0, 500.0))]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(295.0, 500.0);
        resolve_horizontal(&t, &cfg, &mut b, 7.5, &mut Vec::new());
        assert_eq!(b.rect.right(), 302.5);
    }

    #[test]
    fn walking_off_ledge_ignores_its_face() {
        // Ledge top (100..300, y=400); face drawn slightly above the lip.
        let t = terrain(&[
            LineDef::floor((100.0, 400.0), (300.0, 400.0)),
            LineDef::wall((300.0, 396.0), (300.0, 500.0)),
        ]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(298.0, 400.0);
        let mut ev = Vec::new();
        let hit = resolve_horizontal(&t, &cfg, &mut b, 5.0, &mut ev);
        assert!(hit.is_none());
        assert_eq!(b.rect.right(), 303.0);
        assert!(ev.contains(&MotionEvent::CliffIgnored { segment: SegmentId(1) }));
    }

    #[test]
    fn floor_extending_toward_travel_blocks_at_wall_x() {
        // Raised platform to the right of the face; body walks into it from below.
        let t = terrain(&[
            LineDef::floor((300.0, 400.0), (500.0, 400.0)),
            LineDef::wall((300.0, 400.0), (300.0, 500.0)),
        ]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(297.0, 500.0);
        let hit = resolve_horizontal(&t, &cfg, &mut b, 5.0, &mut Vec::new());
        assert_eq!(hit, Some(SegmentId(1)));
        assert_eq!(b.rect.right(), 300.0);
    }

    #[test]
    fn walking_left_off_platform_ignores_face() {
        let t = terrain(&[
            LineDef::floor((300.0, 400.0), (500.0, 400.0)),
            LineDef::wall((300.0, 397.0), (300.0, 500.0)),
        ]);
        let cfg = SimConfig::default();
        let mut b = body_right_at(352.0, 400.0); // left = 302
        assert!(resolve_horizontal(&t, &cfg, &mut b, -5.0, &mut Vec::new()).is_none());
        assert_eq!(b.rect.left(), 297.0);
    }

    #[test]
    fn diagonal_wall_stops_at_first_contact() {
        // Leans right going down: x=300 at y=400, x=340 at y=500.
        let t = terrain(&[LineDef::wall((300.0, 400.0), (340.0, 500.0))]);
        let cfg = SimConfig::default();
        // Rect spans y 420..500; wall at top (y=420) is x=308, the nearest.
        let mut b = body_right_at(300.0, 500.0);
        let hit = resolve_horizontal(&t, &cfg, &mut b, 20.0, &mut Vec::new());
        assert_eq!(hit, Some(SegmentId(0)));
        assert!((b.rect.right() - 308.0).abs() < 1e-3);
    }

    #[test]
    fn diagonal_wall_under_feet_is_ground() {
        // Steep ramp the body is standing on: never a barrier.
        let t = terrain(&[LineDef::wall((200.0, 500.0), (260.0, 380.0))]);
        let cfg = SimConfig::default();
        let mut b = KinematicBody::new(230.0, 440.0, 20.0, 40.0, 5.0);
        let hit = resolve_horizontal(&t, &cfg, &mut b, 3.0, &mut Vec::new());
        assert!(hit.is_none());
        assert_eq!(b.rect.centerx(), 233.0);
    }

    #[test]
    fn steep_wall_rising_from_floor_keeps_blocking() {
        // Leans right going up: x=300 at the floor, x=340 at y=380.
        let t = terrain(&[
            LineDef::floor((0.0, 500.0), (600.0, 500.0)),
            LineDef::wall((300.0, 500.0), (340.0, 380.0)),
        ]);
        let cfg = SimConfig::default();
        let mut b = KinematicBody::new(285.0, 500.0, 20.0, 40.0, 5.0); // right = 295
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        let mut ev = Vec::new();

        for _ in 0..12 {
            resolve_horizontal(&t, &cfg, &mut b, 5.0, &mut ev);
            assert!(b.rect.right() <= 300.0, "passed the wall at right={}", b.rect.right());
        }
        assert_eq!(b.rect.right(), 300.0);
        assert!(ev.contains(&MotionEvent::WallContact { segment: SegmentId(1), x: 300.0 }));
    }

    #[test]
    fn surface_above_feet_is_not_ground() {
        // Surface y = 500 - 2(x - 200); probes at 203.3, 210, 216.7.
        let t = terrain(&[LineDef::wall((200.0, 500.0), (260.0, 380.0))]);
        let cfg = SimConfig::default();
        let wall = t.segment(SegmentId(0)).unwrap();

        // Feet at 510: every probe finds the wall above them.
        let below = Rect::new(200.0, 470.0, 20.0, 40.0);
        assert!(!is_standing_on(wall, &below, None, &cfg));

        // Feet at 486: the left probe finds it 7px below.
        let above = Rect::new(200.0, 446.0, 20.0, 40.0);
        assert!(is_standing_on(wall, &above, None, &cfg));
    }
}
