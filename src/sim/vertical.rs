/// Vertical resolution against floor segments.
///
/// ## Algorithm
///
///   1. Ascending → drop the floor, stay airborne (jumps clear slopes).
///   2. Sample three foot probes: left foot, centre, right foot.
///   3. Every floor × probe is tested against a membership window. The
///      current floor and its junction neighbours get much wider windows
///      than unrelated floors, which is what lets a body glide across a
///      junction without a gap frame.
///   4. Surface height = interpolation clamped to the segment, nudged toward
///      the junction height near shared endpoints (seam smoothing).
///   5. A pair is accepted when `surface − bottom` lies in its accept window.
///   6. Accepted pairs are scored; the best-scoring floor wins.
///   7. The winner is re-sampled under the body's centre. If the centre has
///      crossed into a connected floor, that floor takes over.
///   8. Teleport guard: large snaps are clamped, except when following the
///      slope already underfoot.
///
/// ## Priority per (probe, floor)
///
/// ┌────────────────────────────────────────┬───────┐
/// │ Condition                               │ Bonus │
/// ├────────────────────────────────────────┼───────┤
/// │ current floor, probe inside true bounds │ +1000 │
/// │ current floor, probe only in extension  │  +300 │
/// │ connected to current floor              │  +500 │
/// │ probe inside true bounds                │  +200 │
/// │ floor is sloped                         │   +50 │
/// └────────────────────────────────────────┴───────┘
///
/// Floor score = max priority + 10 × probes hit + 20 × in-bounds hits.
/// Ties: current floor, then smallest height change, then lowest id.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::SimConfig;
use crate::domain::body::KinematicBody;
use crate::domain::terrain::{End, LineSegment, SegmentId, TerrainModel};
use super::event::MotionEvent;
use super::probe::{foot_probes, CENTER};

const CURRENT_STRICT: u32 = 1000;
const CURRENT_EXTENDED: u32 = 300;
const CONNECTED: u32 = 500;
const STRICT: u32 = 200;
const SLOPED: u32 = 50;
const COVERAGE_WEIGHT: u32 = 10;
const STRICT_HIT_WEIGHT: u32 = 20;

/// Extra downward reach for sloped and connected floors.
const SLOPED_STEP_BONUS: f32 = 15.0;
const CONNECTED_STEP_BONUS: f32 = 10.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum VerticalOutcome {
    /// Moving up: floors ignored this tick.
    Ascending,
    /// Standing on this floor.
    Supported(SegmentId),
    /// No floor accepted; caller tries the tile fallbacks.
    NoSupport,
}

/// One accepted (probe, floor) pair.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    segment: SegmentId,
    probe: usize,
    priority: u32,
    strict: bool,
}

#[derive(Default, Debug)]
struct Tally {
    max_priority: u32,
    coverage: u32,
    strict_hits: u32,
}

impl Tally {
    fn score(&self) -> u32 {
        self.max_priority + COVERAGE_WEIGHT * self.coverage + STRICT_HIT_WEIGHT * self.strict_hits
    }
}

/// Resolve vertical motion. The body's rect must already be moved by `dy`;
/// `dx` is the horizontal distance actually travelled this tick.
pub fn resolve_vertical(
    terrain: &TerrainModel,
    cfg: &SimConfig,
    body: &mut KinematicBody,
    dx: f32,
    dy: f32,
    events: &mut Vec<MotionEvent>,
) -> VerticalOutcome {
    if body.is_ascending() || dy < 0.0 {
        body.current_line_id = None;
        body.grounded = false;
        return VerticalOutcome::Ascending;
    }

    let resolver = FloorResolver::new(terrain, cfg, body, dy);
    let probes = foot_probes(&body.rect, &cfg.probe);
    let candidates = resolver.collect(&probes);

    let Some(winner) = resolver.pick_winner(&candidates) else {
        body.current_line_id = None;
        return VerticalOutcome::NoSupport;
    };
    let winner = resolver.centre_handoff(winner, &candidates);
    let Some(seg) = terrain.segment(winner) else {
        body.current_line_id = None;
        return VerticalOutcome::NoSupport;
    };

    let bottom = body.rect.bottom();
    let target = resolver.centre_surface(seg);
    let y_change = target - bottom;
    let previous = body.current_line_id;

    // ── Teleport guard ──
    let following_slope = previous == Some(winner) && seg.is_sloped();
    let cap = if following_slope {
        let expected = seg.gradient().unwrap_or(0.0).abs() * dx.abs();
        cfg.guard.sloped_cap_floor.max(2.0 * expected + 10.0)
    } else {
        cfg.guard.teleport_cap
    };

    let mut applied = target;
    if y_change.abs() > cap {
        if following_slope {
            log::debug!("floor {winner}: slope step {y_change:.1} over cap {cap:.1}, following");
        } else {
            applied = bottom + cap.copysign(y_change);
            log::debug!("floor {winner}: snap {y_change:.1} clamped to {:.1}", applied - bottom);
            events.push(MotionEvent::TeleportClamped { requested: y_change, applied: applied - bottom });
        }
    }

    body.rect.set_bottom(applied);
    body.vy = 0.0;

    if !body.grounded {
        events.push(MotionEvent::Landed { segment: Some(winner), y: applied });
    } else if let Some(from) = previous.filter(|&p| p != winner) {
        log::debug!("floor handover {from} -> {winner}");
        events.push(MotionEvent::SegmentChanged { from, to: winner });
    }

    body.grounded = true;
    body.current_line_id = Some(winner);
    VerticalOutcome::Supported(winner)
}

// ══════════════════════════════════════════════════════════════
// Per-tick resolver state
// ══════════════════════════════════════════════════════════════

static NO_SEGMENTS: BTreeSet<SegmentId> = BTreeSet::new();

struct FloorResolver<'a> {
    terrain: &'a TerrainModel,
    cfg: &'a SimConfig,
    current: Option<SegmentId>,
    connected: &'a BTreeSet<SegmentId>,
    bottom: f32,
    centerx: f32,
    dy: f32,
}

impl<'a> FloorResolver<'a> {
    fn new(terrain: &'a TerrainModel, cfg: &'a SimConfig, body: &KinematicBody, dy: f32) -> Self {
        let current = body
            .current_line_id
            .filter(|&id| terrain.segment(id).map_or(false, LineSegment::is_floor));
        let connected = match current {
            Some(id) => terrain.graph().connected_segments(id),
            None => &NO_SEGMENTS,
        };
        FloorResolver {
            terrain,
            cfg,
            current,
            connected,
            bottom: body.rect.bottom(),
            centerx: body.rect.centerx(),
            dy,
        }
    }

    fn collect(&self, probes: &[f32; 3]) -> Vec<Candidate> {
        let mut out = Vec::new();
        for seg in self.terrain.floors() {
            for (i, &x) in probes.iter().enumerate() {
                if let Some(c) = self.evaluate(seg, x, i) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Membership, surface and accept-window test for one pair.
    fn evaluate(&self, seg: &LineSegment, x: f32, probe: usize) -> Option<Candidate> {
        let j = &self.cfg.junction;
        let p = &self.cfg.probe;
        let s = &self.cfg.step;

        let is_current = self.current == Some(seg.id);
        let is_connected = !is_current && self.connected.contains(&seg.id);
        let sloped = seg.is_sloped();

        // ── Membership ──
        let extension = if is_current {
            p.current_extension
        } else if is_connected {
            p.connected_extension
        } else {
            p.plain_extension
        };
        let strict = seg.contains_x(x);
        let in_window = x >= seg.min_x() - extension && x <= seg.max_x() + extension;

        let endpoint_tol = if sloped { j.sloped_endpoint_tolerance } else { j.endpoint_tolerance };
        let at_endpoint = (x - seg.min_x()).abs() < endpoint_tol || (x - seg.max_x()).abs() < endpoint_tol;
        let junction_tol = if sloped { endpoint_tol * j.junction_scale } else { endpoint_tol };
        let at_junction = [End::P1, End::P2]
            .into_iter()
            .any(|end| (x - seg.endpoint(end).x).abs() < junction_tol && self.has_floor_neighbour(seg.id, end));

        if !(in_window || at_endpoint || at_junction) {
            return None;
        }

        // ── Accept window ──
        let surface_y = self.surface_at(seg, x, endpoint_tol);
        let gap = surface_y - self.bottom;

        let mut tolerance_bottom = s.plain_tolerance_bottom;
        let mut max_step = s.max_slope_step_down;
        if sloped {
            tolerance_bottom = tolerance_bottom.min(s.sloped_tolerance_bottom);
            max_step = max_step.max(s.max_slope_step_up + SLOPED_STEP_BONUS);
        }
        if is_current {
            tolerance_bottom = tolerance_bottom.min(s.current_tolerance_bottom);
            max_step = max_step.max(s.max_slope_step_up);
        } else if is_connected {
            tolerance_bottom = tolerance_bottom.min(s.connected_tolerance_bottom);
            max_step = max_step.max(s.max_slope_step_up + CONNECTED_STEP_BONUS);
        }
        if at_endpoint || at_junction {
            tolerance_bottom = tolerance_bottom.min(s.junction_tolerance_bottom);
            max_step = max_step.max(s.max_slope_step_up);
        }
        // Anything crossed by this tick's fall counts, so speed cannot tunnel.
        tolerance_bottom = tolerance_bottom.min(-(self.dy + 2.0));

        if gap < tolerance_bottom || gap > max_step {
            return None;
        }

        // ── Priority ──
        let mut priority = 0;
        if is_current {
            priority += if strict { CURRENT_STRICT } else { CURRENT_EXTENDED };
        }
        if is_connected {
            priority += CONNECTED;
        }
        if strict {
            priority += STRICT;
        }
        if sloped {
            priority += SLOPED;
        }

        Some(Candidate { segment: seg.id, probe, priority, strict })
    }

    fn pick_winner(&self, candidates: &[Candidate]) -> Option<SegmentId> {
        let mut tallies: BTreeMap<SegmentId, Tally> = BTreeMap::new();
        for c in candidates {
            let t = tallies.entry(c.segment).or_default();
            t.max_priority = t.max_priority.max(c.priority);
            t.coverage += 1;
            if c.strict {
                t.strict_hits += 1;
            }
        }

        // (id, score, is_current, |height change|)
        let mut best: Option<(SegmentId, u32, bool, f32)> = None;
        for (&id, tally) in &tallies {
            let Some(seg) = self.terrain.segment(id) else { continue };
            let score = tally.score();
            let is_current = self.current == Some(id);
            let change = (self.centre_surface(seg) - self.bottom).abs();

            let better = match best {
                None => true,
                Some((_, b_score, b_current, b_change)) => {
                    score > b_score
                        || (score == b_score && is_current && !b_current)
                        || (score == b_score && is_current == b_current && change < b_change)
                }
            };
            if better {
                best = Some((id, score, is_current, change));
            }
        }

        if let Some((id, score, _, _)) = best {
            log::trace!("floor pick {id} (score {score}) from {} candidates", candidates.len());
        }
        best.map(|(id, ..)| id)
    }

    /// The centre probe has left the winner's extent and stands on a
    /// connected floor: that floor takes over.
    fn centre_handoff(&self, winner: SegmentId, candidates: &[Candidate]) -> SegmentId {
        let Some(seg) = self.terrain.segment(winner) else { return winner };
        if seg.contains_x(self.centerx) {
            return winner;
        }
        let graph = self.terrain.graph();
        candidates
            .iter()
            .filter(|c| {
                c.probe == CENTER && c.strict && c.segment != winner && graph.is_connected(winner, c.segment)
            })
            .min_by_key(|c| std::cmp::Reverse(c.priority))
            .map_or(winner, |c| c.segment)
    }

    fn centre_surface(&self, seg: &LineSegment) -> f32 {
        self.surface_at(seg, self.centerx, self.cfg.junction.center_blend_distance)
    }

    /// Clamped interpolation, blended toward the junction height within
    /// `blend_distance` of a shared endpoint.
    fn surface_at(&self, seg: &LineSegment, x: f32, blend_distance: f32) -> f32 {
        let surface = seg.y_at(x);
        if blend_distance <= 0.0 {
            return surface;
        }

        let mut nearest: Option<(f32, f32)> = None; // (distance, seam)
        for end in [End::P1, End::P2] {
            let ep = seg.endpoint(end);
            let dist = (x - ep.x).abs();
            if dist >= blend_distance {
                continue;
            }
            let Some(meet_y) = self.floor_meeting_y(seg.id, end) else { continue };
            let seam = meet_y - ep.y;
            if seam.abs() > self.cfg.junction.seam_tolerance {
                continue;
            }
            if nearest.map_or(true, |(d, _)| dist < d) {
                nearest = Some((dist, seam));
            }
        }

        match nearest {
            Some((dist, seam)) => surface + seam * (1.0 - dist / blend_distance),
            None => surface,
        }
    }

    /// Mean height of the floor endpoints meeting at `seg`'s `end`, if
    /// another floor meets there.
    fn floor_meeting_y(&self, id: SegmentId, end: End) -> Option<f32> {
        if !self.has_floor_neighbour(id, end) {
            return None;
        }
        let junction = self.terrain.graph().junction_of(id, end)?;
        let ys: Vec<f32> = junction
            .members
            .iter()
            .filter_map(|&(s, e)| {
                let seg = self.terrain.segment(s)?;
                seg.is_floor().then(|| seg.endpoint(e).y)
            })
            .collect();
        if ys.is_empty() {
            return None;
        }
        Some(ys.iter().sum::<f32>() / ys.len() as f32)
    }

    fn has_floor_neighbour(&self, id: SegmentId, end: End) -> bool {
        self.terrain
            .graph()
            .neighbours_at(id, end)
            .any(|(s, _)| self.terrain.segment(s).map_or(false, LineSegment::is_floor))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::terrain::{build_terrain, LineDef};

    fn terrain(lines: &[LineDef]) -> TerrainModel {
        build_terrain(lines, &[], &[], None, 5.0)
    }

    /// Drop a 50×80 body by `dy` onto whatever is below and resolve.
    fn settle(t: &TerrainModel, body: &mut KinematicBody, dy: f32) -> (VerticalOutcome, Vec<MotionEvent>) {
        let cfg = SimConfig::default();
        let mut ev = Vec::new();
        body.vy = dy;
        body.rect.translate(0.0, dy);
        let out = resolve_vertical(t, &cfg, body, 0.0, dy, &mut ev);
        (out, ev)
    }

    fn body_at(cx: f32, bottom: f32) -> KinematicBody {
        KinematicBody::new(cx, bottom, 50.0, 80.0, 5.0)
    }

    #[test]
    fn lands_on_flat_floor() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (200.0, 500.0))]);
        let mut b = body_at(100.0, 497.0);
        let (out, ev) = settle(&t, &mut b, 5.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert_eq!(b.rect.bottom(), 500.0);
        assert_eq!(b.vy, 0.0);
        assert!(b.grounded);
        assert_eq!(b.current_line_id, Some(SegmentId(0)));
        assert_eq!(ev, vec![MotionEvent::Landed { segment: Some(SegmentId(0)), y: 500.0 }]);
    }

    #[test]
    fn fast_fall_does_not_tunnel() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (200.0, 500.0))]);
        let mut b = body_at(100.0, 495.0);
        // Feet end 10px below the floor after the move.
        let (out, _) = settle(&t, &mut b, 15.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert_eq!(b.rect.bottom(), 500.0);
    }

    #[test]
    fn floor_above_feet_is_not_support() {
        let t = terrain(&[LineDef::floor((0.0, 450.0), (200.0, 450.0))]);
        let mut b = body_at(100.0, 500.0);
        let (out, _) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::NoSupport);
        assert!(b.current_line_id.is_none());
        assert_eq!(b.rect.bottom(), 501.0);
    }

    #[test]
    fn ascending_drops_the_floor() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (200.0, 500.0))]);
        let cfg = SimConfig::default();
        let mut b = body_at(100.0, 500.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        b.vy = -11.0;
        b.rect.translate(0.0, -11.0);
        let out = resolve_vertical(&t, &cfg, &mut b, 0.0, -11.0, &mut Vec::new());
        assert_eq!(out, VerticalOutcome::Ascending);
        assert!(!b.grounded);
        assert!(b.current_line_id.is_none());
        assert_eq!(b.rect.bottom(), 489.0);
    }

    #[test]
    fn follows_slope_under_centre() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (200.0, 400.0))]);
        let mut b = body_at(100.0, 448.0);
        let (out, _) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert!((b.rect.bottom() - 450.0).abs() < 1e-3);
    }

    #[test]
    fn current_floor_beats_nearer_stranger() {
        // Two overlapping unconnected floors 10px apart; body is on the lower.
        let t = terrain(&[
            LineDef::floor((0.0, 500.0), (300.0, 500.0)),
            LineDef::floor((0.0, 490.0), (300.0, 490.0)),
        ]);
        let mut b = body_at(150.0, 500.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        let (out, _) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert_eq!(b.rect.bottom(), 500.0);
    }

    #[test]
    fn tie_prefers_smaller_height_change() {
        // No current floor: both floors score the same; nearer one wins.
        let t = terrain(&[
            LineDef::floor((0.0, 520.0), (300.0, 520.0)),
            LineDef::floor((0.0, 505.0), (300.0, 505.0)),
        ]);
        let mut b = body_at(150.0, 499.0);
        let (out, _) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(1)));
        assert_eq!(b.rect.bottom(), 505.0);
    }

    #[test]
    fn teleport_guard_clamps_big_snap_onto_stranger() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (100.0, 400.0))]);
        let mut b = body_at(50.0, 394.0);
        // Slope under the centre is y=450: a 55px snap down, over the 50px cap.
        let (out, ev) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert!((b.rect.bottom() - 445.0).abs() < 1e-3);
        assert!(ev.iter().any(|e| matches!(e, MotionEvent::TeleportClamped { .. })));
    }

    #[test]
    fn current_slope_is_followed_past_the_cap() {
        let t = terrain(&[LineDef::floor((0.0, 500.0), (100.0, 400.0))]);
        let mut b = body_at(50.0, 384.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        // Centre surface y=450 sits 65px below the feet: over both the 50px
        // cap and the 60px sloped floor, yet the body stays on its own slope.
        let (out, ev) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(0)));
        assert!((b.rect.bottom() - 450.0).abs() < 1e-3);
        assert!(!ev.iter().any(|e| matches!(e, MotionEvent::TeleportClamped { .. })));
        assert_eq!(b.current_line_id, Some(SegmentId(0)));
    }

    #[test]
    fn seam_between_floors_is_blended() {
        // Right floor starts 4px lower than the left one ends (within snap).
        let t = terrain(&[
            LineDef::floor((0.0, 500.0), (100.0, 500.0)),
            LineDef::floor((100.0, 504.0), (200.0, 504.0)),
        ]);
        assert!(t.graph().is_connected(SegmentId(0), SegmentId(1)));

        // Right at the junction both floors agree on the midpoint.
        let mut b = body_at(100.0, 501.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        settle(&t, &mut b, 1.0);
        assert!((b.rect.bottom() - 502.0).abs() < 1e-3);

        // Far from the junction the floor is exact again.
        let mut b = body_at(170.0, 503.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(1));
        settle(&t, &mut b, 1.0);
        assert_eq!(b.rect.bottom(), 504.0);
    }

    #[test]
    fn segment_change_event_on_handover() {
        let t = terrain(&[
            LineDef::floor((0.0, 500.0), (100.0, 500.0)),
            LineDef::floor((100.0, 500.0), (200.0, 400.0)),
        ]);
        let mut b = body_at(105.0, 500.0);
        b.grounded = true;
        b.current_line_id = Some(SegmentId(0));
        let (out, ev) = settle(&t, &mut b, 1.0);
        assert_eq!(out, VerticalOutcome::Supported(SegmentId(1)));
        assert!((b.rect.bottom() - 495.0).abs() < 1e-3);
        assert!(ev.contains(&MotionEvent::SegmentChanged { from: SegmentId(0), to: SegmentId(1) }));
    }
}
