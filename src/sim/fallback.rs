/// Fallback supports used when no line segment holds the body.
///
/// Slope sprites are tried first on every map. Solid tiles are the legacy
/// terrain: they only take part on maps authored without any line segment.

use crate::config::SimConfig;
use crate::domain::body::KinematicBody;
use crate::domain::terrain::TerrainModel;
use super::event::MotionEvent;
use super::probe::foot_probes;

// ══════════════════════════════════════════════════════════════
// Slope sprites
// ══════════════════════════════════════════════════════════════

/// Land on the nearest slope-sprite surface under the feet.
/// Returns whether a slope tile now supports the body.
pub fn resolve_slope(
    terrain: &TerrainModel,
    cfg: &SimConfig,
    body: &mut KinematicBody,
    events: &mut Vec<MotionEvent>,
) -> bool {
    let tiles = terrain.slope_tiles();
    if tiles.is_empty() {
        return false;
    }

    let bottom = body.rect.bottom();
    let up = cfg.step.max_slope_step_up;
    let down = cfg.step.max_slope_step_down;
    let accepts = |gap: f32| gap >= -up && gap <= down;

    // (tile index, surface y, gap)
    let mut best: Option<(usize, f32, f32)> = None;
    for (i, tile) in tiles.iter().enumerate() {
        for x in foot_probes(&body.rect, &cfg.probe) {
            let Some(surface) = tile.surface_at(x) else { continue };
            let gap = surface - bottom;
            if !accepts(gap) {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, b_surface, b_gap)) => {
                    gap.abs() < b_gap.abs() || (gap.abs() == b_gap.abs() && surface < b_surface)
                }
            };
            if better {
                best = Some((i, surface, gap));
            }
        }
    }

    let Some((index, probe_surface, _)) = best else {
        return false;
    };

    // Stand on the column under the centre when it is over the same tile.
    let y = tiles[index]
        .surface_at(body.rect.centerx())
        .filter(|&s| accepts(s - bottom))
        .unwrap_or(probe_surface);

    log::debug!("slope tile {index} supports at y={y}");
    land(body, y, events);
    events.push(MotionEvent::SlopeSupport { tile: index, y });
    true
}

// ══════════════════════════════════════════════════════════════
// Solid tiles (legacy terrain)
// ══════════════════════════════════════════════════════════════

/// Push the rect out of any solid tile it was moved into, against `dx`.
/// Returns whether a tile blocked.
pub fn resolve_solid_horizontal(terrain: &TerrainModel, body: &mut KinematicBody, dx: f32) -> bool {
    if dx == 0.0 {
        return false;
    }
    let mut blocked = false;
    for tile in terrain.solid_tiles() {
        if !body.rect.intersects(tile) {
            continue;
        }
        if dx > 0.0 {
            body.rect.set_right(tile.left());
        } else {
            body.rect.set_left(tile.right());
        }
        blocked = true;
    }
    if blocked {
        body.vx = 0.0;
        let x = if dx > 0.0 { body.rect.right() } else { body.rect.left() };
        log::debug!("solid tile blocks at x={x}");
    }
    blocked
}

/// Falling: land on the top of an overlapped tile. Rising: stop under it.
/// Returns whether the body is now standing on a tile.
pub fn resolve_solid_vertical(
    terrain: &TerrainModel,
    body: &mut KinematicBody,
    events: &mut Vec<MotionEvent>,
) -> bool {
    let mut supported = false;
    for (i, tile) in terrain.solid_tiles().iter().enumerate() {
        if !body.rect.intersects(tile) {
            continue;
        }
        if body.vy < 0.0 {
            body.rect.set_top(tile.bottom());
            body.vy = 0.0;
            events.push(MotionEvent::HeadBump { tile: i });
        } else {
            let y = tile.top();
            land(body, y, events);
            events.push(MotionEvent::TileSupport { tile: i, y });
            supported = true;
        }
    }
    supported
}

/// Tile supports never set a floor segment.
fn land(body: &mut KinematicBody, y: f32, events: &mut Vec<MotionEvent>) {
    body.rect.set_bottom(y);
    body.vy = 0.0;
    body.current_line_id = None;
    if !body.grounded {
        events.push(MotionEvent::Landed { segment: None, y });
    }
    body.grounded = true;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Rect;
    use crate::domain::slope::AlphaMask;
    use crate::domain::terrain::{build_terrain, SlopeDef};

    /// 51×60 slope sprite at (100, 450): column `c` is solid from row
    /// `50 − c` down, so the surface is `y = 500 − c`. `holes` are left
    /// fully transparent.
    fn ramp(holes: &[usize]) -> TerrainModel {
        let (w, h) = (51, 60);
        let mut opaque = vec![false; w * h];
        for c in 0..w {
            if holes.contains(&c) {
                continue;
            }
            for r in (50 - c)..h {
                opaque[r * w + c] = true;
            }
        }
        let def = SlopeDef { rect: Rect::new(100.0, 450.0, 51.0, 60.0), mask: AlphaMask::new(w, h, opaque) };
        build_terrain(&[], &[], &[def], None, 5.0)
    }

    /// 20-wide body centred over column 25 (x = 125.5).
    fn body_over_ramp(bottom: f32) -> KinematicBody {
        KinematicBody::new(125.5, bottom, 20.0, 40.0, 2.0)
    }

    #[test]
    fn lands_on_centre_column() {
        let t = ramp(&[]);
        let cfg = SimConfig::default();
        let mut b = body_over_ramp(476.0);
        let mut ev = Vec::new();
        assert!(resolve_slope(&t, &cfg, &mut b, &mut ev));
        assert_eq!(b.rect.bottom(), 475.0);
        assert!(b.grounded);
        assert_eq!(b.vy, 0.0);
        assert!(ev.contains(&MotionEvent::SlopeSupport { tile: 0, y: 475.0 }));
        assert!(ev.contains(&MotionEvent::Landed { segment: None, y: 475.0 }));
    }

    #[test]
    fn probe_picks_tile_but_centre_column_sets_height() {
        // Right foot is nearest (gap −2), yet the body stands on column 25.
        let t = ramp(&[]);
        let cfg = SimConfig::default();
        let mut b = body_over_ramp(470.0);
        assert!(resolve_slope(&t, &cfg, &mut b, &mut Vec::new()));
        assert_eq!(b.rect.bottom(), 475.0);
    }

    #[test]
    fn transparent_column_uses_left_neighbour() {
        // Columns 24 and 26 are equidistant; the left one (476) wins.
        let t = ramp(&[25]);
        let cfg = SimConfig::default();
        let mut b = body_over_ramp(476.0);
        assert!(resolve_slope(&t, &cfg, &mut b, &mut Vec::new()));
        assert_eq!(b.rect.bottom(), 476.0);
    }

    #[test]
    fn surface_out_of_reach_is_ignored() {
        let t = ramp(&[]);
        let cfg = SimConfig::default();
        // 100px above the ramp: outside the step-down window.
        let mut b = body_over_ramp(375.0);
        assert!(!resolve_slope(&t, &cfg, &mut b, &mut Vec::new()));
        assert!(!b.grounded);
        assert_eq!(b.rect.bottom(), 375.0);
    }

    fn block_map() -> TerrainModel {
        build_terrain(&[], &[Rect::new(200.0, 400.0, 90.0, 60.0)], &[], None, 5.0)
    }

    #[test]
    fn solid_tile_lands_falling_body() {
        let t = block_map();
        let mut b = KinematicBody::new(240.0, 404.0, 20.0, 40.0, 2.0);
        b.vy = 4.0;
        let mut ev = Vec::new();
        assert!(resolve_solid_vertical(&t, &mut b, &mut ev));
        assert_eq!(b.rect.bottom(), 400.0);
        assert!(b.grounded);
        assert!(ev.contains(&MotionEvent::TileSupport { tile: 0, y: 400.0 }));
    }

    #[test]
    fn solid_tile_stops_rising_head() {
        let t = block_map();
        let mut b = KinematicBody::new(240.0, 495.0, 20.0, 40.0, 2.0); // top 455
        b.vy = -8.0;
        let mut ev = Vec::new();
        assert!(!resolve_solid_vertical(&t, &mut b, &mut ev));
        assert_eq!(b.rect.top(), 460.0);
        assert_eq!(b.vy, 0.0);
        assert!(!b.grounded);
        assert_eq!(ev, vec![MotionEvent::HeadBump { tile: 0 }]);
    }

    #[test]
    fn solid_tile_pushes_out_sideways() {
        let t = block_map();
        // Walked 3px into the tile's left side.
        let mut b = KinematicBody::new(193.0, 450.0, 20.0, 40.0, 2.0);
        b.vx = 1.0;
        assert!(resolve_solid_horizontal(&t, &mut b, 3.0));
        assert_eq!(b.rect.right(), 200.0);
        assert_eq!(b.vx, 0.0);

        // Standing on top is not a side collision.
        let mut b = KinematicBody::new(240.0, 400.0, 20.0, 40.0, 2.0);
        assert!(!resolve_solid_horizontal(&t, &mut b, 3.0));
    }
}
