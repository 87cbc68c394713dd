/// Junction index over segment endpoints.
///
/// Endpoints closer than the snap tolerance are merged into one junction,
/// transitively (union-find), so a chain of slightly-misaligned editor
/// strokes reads as one connected surface. Built once per map; every
/// "is this segment connected to that one" question afterwards is a lookup.

use std::collections::BTreeSet;

use super::geometry::Vec2;
use super::terrain::{End, LineSegment, SegmentId};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct JunctionId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Junction {
    pub id: JunctionId,
    /// Mean of all member endpoints.
    pub centroid: Vec2,
    /// Member endpoints, in segment order.
    pub members: Vec<(SegmentId, End)>,
}

impl Junction {
    /// Does more than one segment meet here?
    pub fn is_shared(&self) -> bool {
        self.members.iter().any(|&(s, _)| s != self.members[0].0)
    }
}

static NO_SEGMENTS: BTreeSet<SegmentId> = BTreeSet::new();

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectivityGraph {
    junctions: Vec<Junction>,
    /// `endpoint_junction[seg] = [junction of p1, junction of p2]`
    endpoint_junction: Vec<[JunctionId; 2]>,
    /// `connected[seg]` = every other segment sharing a junction with it.
    connected: Vec<BTreeSet<SegmentId>>,
}

impl ConnectivityGraph {
    /// Cluster endpoints of `segments` within `snap_tolerance` (Euclidean).
    /// `segments[i].id` must equal `SegmentId(i)`.
    pub fn build(segments: &[LineSegment], snap_tolerance: f32) -> Self {
        let n = segments.len() * 2;
        let point = |e: usize| segments[e / 2].endpoint(if e % 2 == 0 { End::P1 } else { End::P2 });

        // ── Union-find over endpoint slots (2*seg + end) ──
        let mut parent: Vec<usize> = (0..n).collect();
        for a in 0..n {
            for b in (a + 1)..n {
                if point(a).distance(point(b)) <= snap_tolerance {
                    union(&mut parent, a, b);
                }
            }
        }

        // ── Number junctions in first-occurrence order ──
        let mut root_to_junction: Vec<Option<JunctionId>> = vec![None; n];
        let mut junctions: Vec<Junction> = Vec::new();
        let mut endpoint_junction = vec![[JunctionId(0); 2]; segments.len()];

        for e in 0..n {
            let root = find(&mut parent, e);
            let jid = *root_to_junction[root].get_or_insert_with(|| {
                let id = JunctionId(junctions.len());
                junctions.push(Junction { id, centroid: Vec2::default(), members: Vec::new() });
                id
            });
            let end = if e % 2 == 0 { End::P1 } else { End::P2 };
            junctions[jid.0].members.push((SegmentId(e / 2), end));
            endpoint_junction[e / 2][e % 2] = jid;
        }

        for j in &mut junctions {
            let count = j.members.len() as f32;
            let (sx, sy) = j.members.iter().fold((0.0, 0.0), |(sx, sy), &(s, end)| {
                let p = segments[s.0].endpoint(end);
                (sx + p.x, sy + p.y)
            });
            j.centroid = Vec2::new(sx / count, sy / count);
        }

        // ── Adjacency (symmetric by construction) ──
        let mut connected = vec![BTreeSet::new(); segments.len()];
        for j in &junctions {
            for &(a, _) in &j.members {
                for &(b, _) in &j.members {
                    if a != b {
                        connected[a.0].insert(b);
                    }
                }
            }
        }

        ConnectivityGraph { junctions, endpoint_junction, connected }
    }

    /// All segments sharing a junction with `id` (never includes `id`).
    pub fn connected_segments(&self, id: SegmentId) -> &BTreeSet<SegmentId> {
        self.connected.get(id.0).unwrap_or(&NO_SEGMENTS)
    }

    pub fn is_connected(&self, a: SegmentId, b: SegmentId) -> bool {
        self.connected_segments(a).contains(&b)
    }

    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junctions.get(id.0)
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// The junction holding one endpoint of a segment.
    pub fn junction_of(&self, id: SegmentId, end: End) -> Option<&Junction> {
        let slots = self.endpoint_junction.get(id.0)?;
        let jid = match end {
            End::P1 => slots[0],
            End::P2 => slots[1],
        };
        self.junction(jid)
    }

    /// Other segments' endpoints meeting `id` at `end`.
    pub fn neighbours_at(&self, id: SegmentId, end: End) -> impl Iterator<Item = (SegmentId, End)> + '_ {
        self.junction_of(id, end)
            .into_iter()
            .flat_map(|j| j.members.iter().copied())
            .filter(move |&(s, _)| s != id)
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Smaller slot index always becomes the root.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
