/// Events emitted while resolving one body for one tick.
/// Animation, sound and debug overlays consume these; the resolver never
/// reads them back.

use crate::domain::terrain::SegmentId;

#[derive(Clone, Debug, PartialEq)]
pub enum MotionEvent {
    /// Support found after being airborne.
    Landed { segment: Option<SegmentId>, y: f32 },
    /// Support lost while walking (jumps clear `grounded` before the tick).
    LeftGround,
    /// Handed over from one floor segment to another while grounded.
    SegmentChanged { from: SegmentId, to: SegmentId },
    /// A wall clamped the leading edge.
    WallContact { segment: SegmentId, x: f32 },
    /// A wall was passed because it is the face of the ledge being left.
    CliffIgnored { segment: SegmentId },
    /// A large vertical snap was limited by the teleport guard.
    TeleportClamped { requested: f32, applied: f32 },
    /// Supported by a slope sprite instead of line terrain.
    SlopeSupport { tile: usize, y: f32 },
    /// Supported by a legacy solid tile.
    TileSupport { tile: usize, y: f32 },
    /// Hit the underside of a solid tile while rising.
    HeadBump { tile: usize },
    /// Stopped by the bottom of the map.
    MapFloor { y: f32 },
    /// Reached the end of the patrol leash and turned around.
    PatrolTurned,
}
