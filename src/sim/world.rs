/// World: one map's terrain plus every body moving on it.
///
/// ## Tick
///
/// Bodies advance one after another in spawn order, each with the
/// configured gravity. Bodies never push each other; only terrain resolves
/// them. The terrain is immutable after load, so a `World` can be rebuilt
/// from the same map at any time to replay a run.

use crate::config::SimConfig;
use crate::domain::body::{KinematicBody, MoveIntent};
use crate::domain::terrain::TerrainModel;
use crate::map::{LoadedMap, SpawnKind};
use super::event::MotionEvent;
use super::step::integrate;

pub struct World {
    pub terrain: TerrainModel,
    pub config: SimConfig,
    pub bodies: Vec<KinematicBody>,
    /// Index of the player-controlled body, if one was spawned.
    pub player: Option<usize>,
    pub tick: u64,
}

impl World {
    pub fn new(terrain: TerrainModel, config: SimConfig) -> Self {
        World { terrain, config, bodies: Vec::new(), player: None, tick: 0 }
    }

    /// Build a world from a loaded map, spawning its player and mobs.
    /// Spawn coordinates are rect centres.
    pub fn from_map(map: LoadedMap, config: SimConfig) -> Self {
        let mut world = World::new(map.terrain, config);
        for s in &map.spawns {
            let bottom = s.y + s.height / 2.0;
            match s.kind {
                SpawnKind::Player => {
                    let idx = world.spawn_player(s.x, bottom, s.width, s.height);
                    if let Some(speed) = s.speed {
                        world.bodies[idx].speed = speed;
                    }
                }
                SpawnKind::Mob => {
                    let speed = s.speed.unwrap_or(world.config.motion.mob_speed);
                    let radius = s.patrol_radius.unwrap_or(world.config.motion.patrol_radius);
                    world.spawn(KinematicBody::mob(s.x, bottom, s.width, s.height, speed, radius));
                }
            }
        }
        log::info!("world: {} bodies, player {:?}", world.bodies.len(), world.player);
        world
    }

    pub fn spawn(&mut self, body: KinematicBody) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Spawn the player-controlled body. A second call moves control to
    /// the new body.
    pub fn spawn_player(&mut self, cx: f32, bottom: f32, width: f32, height: f32) -> usize {
        let body = KinematicBody::new(cx, bottom, width, height, self.config.motion.player_speed);
        let idx = self.spawn(body);
        self.player = Some(idx);
        idx
    }

    pub fn player(&self) -> Option<&KinematicBody> {
        self.player.and_then(|i| self.bodies.get(i))
    }

    /// Set the held direction of the player body.
    pub fn set_player_intent(&mut self, intent: MoveIntent) {
        if let Some(body) = self.player.and_then(|i| self.bodies.get_mut(i)) {
            body.intent = intent;
        }
    }

    /// Make body `idx` jump with the configured launch speed.
    pub fn jump(&mut self, idx: usize) -> bool {
        let velocity = self.config.motion.jump_velocity;
        self.bodies.get_mut(idx).map_or(false, |b| b.jump(velocity))
    }

    /// Advance every body by one tick. Events are tagged with the body index.
    pub fn step(&mut self) -> Vec<(usize, MotionEvent)> {
        self.tick += 1;
        let gravity = self.config.motion.gravity;
        let mut out = Vec::new();
        for (i, body) in self.bodies.iter_mut().enumerate() {
            let dx = body.intended_dx();
            let events = integrate(&self.terrain, &self.config, body, dx, gravity);
            out.extend(events.into_iter().map(|e| (i, e)));
        }
        out
    }
}
