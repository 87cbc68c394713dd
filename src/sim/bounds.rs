/// Final clamps of a tick: patrol leash, then map bounds.
///
/// The map's top edge is open so jumps can leave the screen.

use crate::domain::body::{KinematicBody, MoveIntent};
use crate::domain::terrain::TerrainModel;
use super::event::MotionEvent;

pub fn clamp_bounds(terrain: &TerrainModel, body: &mut KinematicBody, events: &mut Vec<MotionEvent>) {
    clamp_patrol(body, events);

    let Some(b) = terrain.bounds() else { return };

    // Right first so a body wider than the map ends up flush left.
    if body.rect.right() > b.max_x {
        body.rect.set_right(b.max_x);
    }
    if body.rect.left() < b.min_x {
        body.rect.set_left(b.min_x);
    }

    if body.rect.bottom() > b.max_y {
        body.rect.set_bottom(b.max_y);
        body.vy = 0.0;
        body.current_line_id = None;
        if !body.grounded {
            events.push(MotionEvent::Landed { segment: None, y: b.max_y });
        }
        body.grounded = true;
        events.push(MotionEvent::MapFloor { y: b.max_y });
    }
}

/// Keep a patrolling body's centre within its leash and turn it around
/// at either end.
fn clamp_patrol(body: &mut KinematicBody, events: &mut Vec<MotionEvent>) {
    let Some(patrol) = body.patrol else { return };
    let lo = patrol.spawn_x - patrol.radius;
    let hi = patrol.spawn_x + patrol.radius;
    let cx = body.rect.centerx();

    let turn = if cx < lo {
        body.rect.set_centerx(lo);
        MoveIntent::RIGHT
    } else if cx > hi {
        body.rect.set_centerx(hi);
        MoveIntent::LEFT
    } else {
        return;
    };

    if body.intent != turn {
        body.intent = turn;
        events.push(MotionEvent::PatrolTurned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::terrain::{build_terrain, MapBounds};

    fn bounded(min_x: f32, max_x: f32, max_y: f32) -> TerrainModel {
        let b = MapBounds { min_x, max_x, min_y: 0.0, max_y };
        build_terrain(&[], &[], &[], Some(b), 5.0)
    }

    #[test]
    fn clamps_sides_and_bottom() {
        let t = bounded(0.0, 800.0, 600.0);
        let mut ev = Vec::new();

        let mut b = KinematicBody::new(790.0, 650.0, 40.0, 60.0, 3.0);
        b.vy = 9.0;
        clamp_bounds(&t, &mut b, &mut ev);
        assert_eq!(b.rect.right(), 800.0);
        assert_eq!(b.rect.bottom(), 600.0);
        assert_eq!(b.vy, 0.0);
        assert!(b.grounded);
        assert!(b.current_line_id.is_none());
        assert!(ev.contains(&MotionEvent::MapFloor { y: 600.0 }));

        let mut b = KinematicBody::new(5.0, 300.0, 40.0, 60.0, 3.0);
        clamp_bounds(&t, &mut b, &mut Vec::new());
        assert_eq!(b.rect.left(), 0.0);
        assert!(!b.grounded);
    }

    #[test]
    fn top_is_not_clamped() {
        let t = bounded(0.0, 800.0, 600.0);
        let mut b = KinematicBody::new(400.0, 20.0, 40.0, 60.0, 3.0);
        clamp_bounds(&t, &mut b, &mut Vec::new());
        assert_eq!(b.rect.top(), -40.0);
    }

    #[test]
    fn body_wider_than_map_sits_flush_left() {
        let t = bounded(0.0, 100.0, 600.0);
        let mut b = KinematicBody::new(50.0, 300.0, 140.0, 60.0, 3.0);
        clamp_bounds(&t, &mut b, &mut Vec::new());
        assert_eq!(b.rect.left(), 0.0);
    }

    #[test]
    fn no_bounds_no_clamp() {
        let t = TerrainModel::empty();
        let mut b = KinematicBody::new(-500.0, 9000.0, 40.0, 60.0, 3.0);
        clamp_bounds(&t, &mut b, &mut Vec::new());
        assert_eq!(b.rect.bottom(), 9000.0);
    }

    #[test]
    fn patrol_turns_at_leash_ends() {
        let t = TerrainModel::empty();
        let mut m = KinematicBody::mob(400.0, 300.0, 40.0, 40.0, 1.0, 150.0);
        let mut ev = Vec::new();

        m.rect.set_centerx(249.0);
        clamp_bounds(&t, &mut m, &mut ev);
        assert_eq!(m.rect.centerx(), 250.0);
        assert_eq!(m.intent, MoveIntent::RIGHT);
        assert_eq!(ev, vec![MotionEvent::PatrolTurned]);

        m.rect.set_centerx(551.0);
        clamp_bounds(&t, &mut m, &mut ev);
        assert_eq!(m.rect.centerx(), 550.0);
        assert_eq!(m.intent, MoveIntent::LEFT);
        assert_eq!(ev.len(), 2);

        // Inside the leash nothing changes.
        m.rect.set_centerx(420.0);
        clamp_bounds(&t, &mut m, &mut ev);
        assert_eq!(m.intent, MoveIntent::LEFT);
        assert_eq!(ev.len(), 2);
    }
}
