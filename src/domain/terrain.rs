/// Terrain model: the immutable per-map description the resolver runs against.
///
/// ## Layers
///
///   1. LINES : floor and wall segments drawn in the editor (primary terrain)
///   2. SLOPES : slope sprites, surface heights sampled from their alpha masks
///   3. SOLIDS : axis-aligned tile rects (legacy maps without line terrain)
///
/// Segments are addressed by `SegmentId`, an index into `segments`, assigned
/// once here. Nothing downstream holds references into the model across ticks.
///
/// Malformed input is dropped with a warning and counted in `skipped`;
/// building never fails.

use serde::Deserialize;

use super::geometry::{Rect, Vec2};
use super::junction::ConnectivityGraph;
use super::slope::{AlphaMask, SlopeTile};

/// A segment whose |Δy| exceeds this is "sloped" rather than flat.
pub const SLOPE_EPSILON: f32 = 1.0;

/// A segment whose |Δx| is below this is vertical (cannot be walked on).
pub const VERTICAL_EPSILON: f32 = 1.0;

// ══════════════════════════════════════════════════════════════
// Segments
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SegmentId(pub usize);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Floor,
    Wall,
}

/// Which endpoint of a segment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum End {
    P1,
    P2,
}

impl End {
    pub fn other(self) -> End {
        match self {
            End::P1 => End::P2,
            End::P2 => End::P1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LineSegment {
    pub id: SegmentId,
    pub p1: Vec2,
    pub p2: Vec2,
    pub kind: SegmentKind,
}

impl LineSegment {
    pub fn min_x(&self) -> f32 { self.p1.x.min(self.p2.x) }
    pub fn max_x(&self) -> f32 { self.p1.x.max(self.p2.x) }
    pub fn min_y(&self) -> f32 { self.p1.y.min(self.p2.y) }
    pub fn max_y(&self) -> f32 { self.p1.y.max(self.p2.y) }

    pub fn endpoint(&self, end: End) -> Vec2 {
        match end {
            End::P1 => self.p1,
            End::P2 => self.p2,
        }
    }

    /// The upper endpoint (smaller y). P1 on a tie.
    pub fn top_end(&self) -> End {
        if self.p2.y < self.p1.y { End::P2 } else { End::P1 }
    }

    pub fn is_floor(&self) -> bool {
        self.kind == SegmentKind::Floor
    }

    pub fn is_sloped(&self) -> bool {
        (self.p2.y - self.p1.y).abs() > SLOPE_EPSILON
    }

    pub fn is_vertical(&self) -> bool {
        (self.p2.x - self.p1.x).abs() < VERTICAL_EPSILON
    }

    /// dy/dx, or `None` for a vertical segment.
    pub fn gradient(&self) -> Option<f32> {
        let dx = self.p2.x - self.p1.x;
        if dx.abs() < f32::EPSILON { return None; }
        Some((self.p2.y - self.p1.y) / dx)
    }

    /// Is `x` inside the true horizontal extent (inclusive)?
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }

    /// Surface height at `x`, with `x` clamped to the segment's extent.
    /// Never extrapolates past the endpoints.
    pub fn y_at(&self, x: f32) -> f32 {
        let dx = self.p2.x - self.p1.x;
        if dx.abs() < f32::EPSILON {
            return self.min_y();
        }
        let x = x.clamp(self.min_x(), self.max_x());
        let t = (x - self.p1.x) / dx;
        self.p1.y + (self.p2.y - self.p1.y) * t
    }

    /// Where the infinite line through the segment crosses height `y`,
    /// if that point lies on the segment.
    pub fn x_at(&self, y: f32) -> Option<f32> {
        if y < self.min_y() || y > self.max_y() { return None; }
        let dy = self.p2.y - self.p1.y;
        if dy.abs() < f32::EPSILON { return None; }
        let t = (y - self.p1.y) / dy;
        Some(self.p1.x + (self.p2.x - self.p1.x) * t)
    }
}

// ══════════════════════════════════════════════════════════════
// Build inputs
// ══════════════════════════════════════════════════════════════

/// One line as authored: `{ "p1": [x, y], "p2": [x, y], "type": "floor" }`.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct LineDef {
    pub p1: Vec2,
    pub p2: Vec2,
    #[serde(rename = "type", default)]
    pub kind: Option<SegmentKind>,
}

impl LineDef {
    pub fn floor(p1: (f32, f32), p2: (f32, f32)) -> Self {
        LineDef { p1: Vec2::new(p1.0, p1.1), p2: Vec2::new(p2.0, p2.1), kind: Some(SegmentKind::Floor) }
    }

    pub fn wall(p1: (f32, f32), p2: (f32, f32)) -> Self {
        LineDef { p1: Vec2::new(p1.0, p1.1), p2: Vec2::new(p2.0, p2.1), kind: Some(SegmentKind::Wall) }
    }
}

/// A placed slope sprite before its surface profile is derived.
#[derive(Clone, Debug)]
pub struct SlopeDef {
    pub rect: Rect,
    pub mask: AlphaMask,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MapBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl MapBounds {
    pub fn from_rect(r: Rect) -> Self {
        MapBounds { min_x: r.left(), max_x: r.right(), min_y: r.top(), max_y: r.bottom() }
    }
}

// ══════════════════════════════════════════════════════════════
// TerrainModel
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct TerrainModel {
    segments: Vec<LineSegment>,
    floors: Vec<SegmentId>,
    walls: Vec<SegmentId>,
    slope_tiles: Vec<SlopeTile>,
    solid_tiles: Vec<Rect>,
    bounds: Option<MapBounds>,
    graph: ConnectivityGraph,
    skipped: usize,
}

impl TerrainModel {
    /// Terrain with nothing in it (everything falls until the bounds floor).
    pub fn empty() -> Self {
        build_terrain(&[], &[], &[], None, 5.0)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&LineSegment> {
        self.segments.get(id.0)
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn floors(&self) -> impl Iterator<Item = &LineSegment> + '_ {
        self.floors.iter().filter_map(move |&id| self.segment(id))
    }

    pub fn walls(&self) -> impl Iterator<Item = &LineSegment> + '_ {
        self.walls.iter().filter_map(move |&id| self.segment(id))
    }

    pub fn has_lines(&self) -> bool {
        !self.segments.is_empty()
    }

    pub fn slope_tiles(&self) -> &[SlopeTile] {
        &self.slope_tiles
    }

    pub fn solid_tiles(&self) -> &[Rect] {
        &self.solid_tiles
    }

    pub fn bounds(&self) -> Option<MapBounds> {
        self.bounds
    }

    pub fn graph(&self) -> &ConnectivityGraph {
        &self.graph
    }

    /// Number of malformed inputs dropped while building.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Build the terrain model for one map. Runs once per map load.
pub fn build_terrain(
    lines: &[LineDef],
    solid_tiles: &[Rect],
    slope_defs: &[SlopeDef],
    bounds: Option<MapBounds>,
    snap_tolerance: f32,
) -> TerrainModel {
    let mut skipped = 0;

    // ── Lines ──
    let mut segments: Vec<LineSegment> = Vec::with_capacity(lines.len());
    for (i, def) in lines.iter().enumerate() {
        if !def.p1.is_finite() || !def.p2.is_finite() {
            log::warn!("terrain: line {i} has non-finite coordinates, skipped");
            skipped += 1;
            continue;
        }
        if def.p1.distance(def.p2) < f32::EPSILON {
            log::warn!("terrain: line {i} has zero length at ({}, {}), skipped", def.p1.x, def.p1.y);
            skipped += 1;
            continue;
        }

        let dx = (def.p2.x - def.p1.x).abs();
        let dy = (def.p2.y - def.p1.y).abs();
        let mut kind = def.kind.unwrap_or(if dy > dx { SegmentKind::Wall } else { SegmentKind::Floor });
        if kind == SegmentKind::Floor && dx < VERTICAL_EPSILON {
            log::warn!("terrain: line {i} is a vertical floor, treating it as a wall");
            kind = SegmentKind::Wall;
        }

        let id = SegmentId(segments.len());
        segments.push(LineSegment { id, p1: def.p1, p2: def.p2, kind });
    }

    let floors = segments.iter().filter(|s| s.is_floor()).map(|s| s.id).collect();
    let walls = segments.iter().filter(|s| !s.is_floor()).map(|s| s.id).collect();

    // ── Solid tiles ──
    let mut solids = Vec::with_capacity(solid_tiles.len());
    for (i, r) in solid_tiles.iter().enumerate() {
        let finite = r.x.is_finite() && r.y.is_finite() && r.w.is_finite() && r.h.is_finite();
        if !finite || r.w <= 0.0 || r.h <= 0.0 {
            log::warn!("terrain: solid tile {i} has an empty or invalid rect, skipped");
            skipped += 1;
            continue;
        }
        solids.push(*r);
    }

    // ── Slope tiles ──
    let mut slopes = Vec::with_capacity(slope_defs.len());
    for (i, def) in slope_defs.iter().enumerate() {
        match SlopeTile::from_mask(def.rect, &def.mask) {
            Some(tile) => slopes.push(tile),
            None => {
                log::warn!("terrain: slope sprite {i} has no opaque pixels, skipped");
                skipped += 1;
            }
        }
    }

    let bounds = bounds.or_else(|| derive_bounds(&segments, &solids, &slopes));
    let graph = ConnectivityGraph::build(&segments, snap_tolerance);

    log::debug!(
        "terrain built: {} segments ({} junctions), {} slope tiles, {} solid tiles, {} skipped",
        segments.len(), graph.junctions().len(), slopes.len(), solids.len(), skipped
    );

    TerrainModel {
        segments,
        floors,
        walls,
        slope_tiles: slopes,
        solid_tiles: solids,
        bounds,
        graph,
        skipped,
    }
}

/// Bounding box of tiles, else of line segments, else nothing.
fn derive_bounds(segments: &[LineSegment], solids: &[Rect], slopes: &[SlopeTile]) -> Option<MapBounds> {
    let tile_box = solids
        .iter()
        .copied()
        .chain(slopes.iter().map(|s| s.rect))
        .reduce(|a, b| a.union(&b));
    if let Some(r) = tile_box {
        return Some(MapBounds::from_rect(r));
    }

    let first = segments.first()?;
    let mut b = MapBounds {
        min_x: first.min_x(),
        max_x: first.max_x(),
        min_y: first.min_y(),
        max_y: first.max_y(),
    };
    for s in &segments[1..] {
        b.min_x = b.min_x.min(s.min_x());
        b.max_x = b.max_x.max(s.max_x());
        b.min_y = b.min_y.min(s.min_y());
        b.max_y = b.max_y.max(s.max_y());
    }
    Some(b)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
