/// Plain 2D geometry shared by terrain and bodies.
///
/// Screen convention: +x right, +y DOWN. A smaller `y` is higher on screen,
/// so "bottom" is the largest y of a rect.

use serde::Deserialize;

/// A point in world pixels.
#[derive(Clone, Copy, PartialEq, Debug, Default, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from(p: [f32; 2]) -> Self {
        Vec2 { x: p[0], y: p[1] }
    }
}

/// Axis-aligned rectangle: `(x, y)` is the top-left corner.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Rect of size `w × h` whose bottom edge is centred on `(cx, bottom)`.
    pub fn from_bottom_center(cx: f32, bottom: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: bottom - h, w, h }
    }

    #[inline] pub fn left(&self) -> f32 { self.x }
    #[inline] pub fn right(&self) -> f32 { self.x + self.w }
    #[inline] pub fn top(&self) -> f32 { self.y }
    #[inline] pub fn bottom(&self) -> f32 { self.y + self.h }
    #[inline] pub fn centerx(&self) -> f32 { self.x + self.w / 2.0 }

    #[inline] pub fn set_left(&mut self, v: f32) { self.x = v; }
    #[inline] pub fn set_right(&mut self, v: f32) { self.x = v - self.w; }
    #[inline] pub fn set_top(&mut self, v: f32) { self.y = v; }
    #[inline] pub fn set_bottom(&mut self, v: f32) { self.y = v - self.h; }
    #[inline] pub fn set_centerx(&mut self, v: f32) { self.x = v - self.w / 2.0; }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Open-interval overlap (touching edges do not collide).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Does `x` lie within `[left, right)`?
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.left() && x < self.right()
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}
