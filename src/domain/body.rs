/// Kinematic bodies: the per-entity state the resolver reads and writes.
/// Players and mobs share one representation; a mob is a body with a patrol.

use super::geometry::Rect;
use super::terrain::SegmentId;

/// Held movement keys / AI movement flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    pub const NONE: MoveIntent = MoveIntent { left: false, right: false };
    pub const LEFT: MoveIntent = MoveIntent { left: true, right: false };
    pub const RIGHT: MoveIntent = MoveIntent { left: false, right: true };

    /// -1, 0 or +1. Both held cancel out.
    pub fn axis(self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Horizontal leash around a spawn point.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Patrol {
    pub spawn_x: f32,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KinematicBody {
    pub rect: Rect,
    /// Extra horizontal velocity (dash/knock-back); reset on landing ticks.
    pub vx: f32,
    /// Vertical velocity, +y is down.
    pub vy: f32,
    pub grounded: bool,
    /// Floor segment this body resolved against last tick.
    pub current_line_id: Option<SegmentId>,
    /// Pixels per tick while a direction is held.
    pub speed: f32,
    pub intent: MoveIntent,
    pub patrol: Option<Patrol>,
}

impl KinematicBody {
    /// Airborne body whose rect bottom is centred on `(cx, bottom)`.
    pub fn new(cx: f32, bottom: f32, width: f32, height: f32, speed: f32) -> Self {
        KinematicBody {
            rect: Rect::from_bottom_center(cx, bottom, width, height),
            vx: 0.0,
            vy: 0.0,
            grounded: false,
            current_line_id: None,
            speed,
            intent: MoveIntent::NONE,
            patrol: None,
        }
    }

    /// A mob: patrols `radius` pixels either side of its spawn x,
    /// starting out walking left.
    pub fn mob(cx: f32, bottom: f32, width: f32, height: f32, speed: f32, radius: f32) -> Self {
        let mut body = Self::new(cx, bottom, width, height, speed);
        body.patrol = Some(Patrol { spawn_x: cx, radius });
        body.intent = MoveIntent::LEFT;
        body
    }

    /// Start a jump if standing on something. Returns whether it fired.
    /// `velocity` is the upward launch speed (positive number).
    pub fn jump(&mut self, velocity: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.vy = -velocity.abs();
        self.grounded = false;
        self.current_line_id = None;
        true
    }

    /// Walking displacement requested by the held direction (excludes `vx`).
    pub fn intended_dx(&self) -> f32 {
        self.intent.axis() * self.speed
    }

    pub fn is_ascending(&self) -> bool {
        self.vy < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_axis() {
        assert_eq!(MoveIntent::LEFT.axis(), -1.0);
        assert_eq!(MoveIntent::RIGHT.axis(), 1.0);
        assert_eq!(MoveIntent::NONE.axis(), 0.0);
        assert_eq!(MoveIntent { left: true, right: true }.axis(), 0.0);
    }

    #[test]
    fn jump_only_from_ground() {
        let mut b = KinematicBody::new(50.0, 500.0, 50.0, 80.0, 5.0);
        assert!(!b.jump(11.0));
        assert_eq!(b.vy, 0.0);

        b.grounded = true;
        b.current_line_id = Some(SegmentId(3));
        assert!(b.jump(11.0));
        assert_eq!(b.vy, -11.0);
        assert!(!b.grounded);
        assert!(b.current_line_id.is_none());
        assert!(b.is_ascending());
    }

    #[test]
    fn mob_starts_patrolling_left() {
        let m = KinematicBody::mob(400.0, 300.0, 40.0, 40.0, 1.0, 150.0);
        assert_eq!(m.patrol, Some(Patrol { spawn_x: 400.0, radius: 150.0 }));
        assert_eq!(m.intended_dx(), -1.0);
        assert_eq!(m.rect.centerx(), 400.0);
    }
}
