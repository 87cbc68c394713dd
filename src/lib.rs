/// slopewalk: kinematic terrain collision for a 2D side-scroller.
///
/// ## Layers
///
///   domain/ : terrain model, junction graph, slope profiles, bodies
///   sim/    : the per-tick resolvers and the multi-body world
///   map     : editor JSON + tile manifest + sprites → terrain
///   config  : `slopewalk.toml` tolerances and motion constants
///
/// Build terrain once per map (`build_terrain` or `map::load_map`), then call
/// `integrate` for every body every tick, or let `World::step` do it.

pub mod config;
pub mod domain;
pub mod map;
pub mod sim;

pub use config::SimConfig;
pub use domain::body::{KinematicBody, MoveIntent};
pub use domain::terrain::{build_terrain, LineDef, SegmentId, TerrainModel};
pub use sim::event::MotionEvent;
pub use sim::step::{integrate, integrated};
pub use sim::world::World;
