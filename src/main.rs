/// Trace runner: replays scripted input on a map and prints every body's
/// state each tick. Used to reproduce and bisect terrain glitches
/// (teleports at junctions, sinking on slopes) without a renderer.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use slopewalk::config::SimConfig;
use slopewalk::domain::body::MoveIntent;
use slopewalk::map::load_map;
use slopewalk::sim::event::MotionEvent;
use slopewalk::sim::world::World;

const USAGE: &str = "usage: slopewalk <map.json> [--ticks N] [--walk left|right|none] [--jump-at T]...";
const DEFAULT_TICKS: u64 = 120;

#[derive(Debug, PartialEq)]
struct Script {
    map: PathBuf,
    ticks: u64,
    walk: MoveIntent,
    jump_at: Vec<u64>,
}

fn main() -> ExitCode {
    #[cfg(feature = "cli-log")]
    env_logger::init();

    let script = match parse_args(std::env::args().skip(1)) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = SimConfig::load();
    let path = resolve_map_path(&script.map, &config.maps_dir);
    let map = match load_map(&path, &config) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Map load failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut world = World::from_map(map, config);
    if world.bodies.is_empty() {
        eprintln!("{} has no spawns; nothing to trace", path.display());
        return ExitCode::FAILURE;
    }
    world.set_player_intent(script.walk);

    let clamped = run(&mut world, &script);

    println!();
    println!("Ticks: {}   Bodies: {}   Teleports clamped: {clamped}", world.tick, world.bodies.len());
    ExitCode::SUCCESS
}

/// Step the world `script.ticks` times, printing one line per body per tick
/// and one per event. Returns how many snaps the teleport guard clamped.
fn run(world: &mut World, script: &Script) -> usize {
    println!("{:>5} {:>3} {:>9} {:>9} {:>7} {:>3} {:>6}", "tick", "id", "centerx", "bottom", "vy", "gnd", "line");
    let mut clamped = 0;

    for t in 1..=script.ticks {
        if script.jump_at.contains(&t) {
            if let Some(p) = world.player {
                world.jump(p);
            }
        }
        let events = world.step();

        for (i, b) in world.bodies.iter().enumerate() {
            let line = b.current_line_id.map_or_else(|| "-".to_string(), |id| id.to_string());
            println!(
                "{t:>5} {i:>3} {:>9.2} {:>9.2} {:>7.2} {:>3} {line:>6}",
                b.rect.centerx(),
                b.rect.bottom(),
                b.vy,
                if b.grounded { "y" } else { "n" },
            );
        }
        for (i, e) in &events {
            if matches!(e, MotionEvent::TeleportClamped { .. }) {
                clamped += 1;
            }
            println!("{:>5} {i:>3}   {e:?}", "");
        }
    }
    clamped
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Script, String> {
    let mut map = None;
    let mut ticks = DEFAULT_TICKS;
    let mut walk = MoveIntent::NONE;
    let mut jump_at = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                let v = args.next().ok_or("--ticks needs a value")?;
                ticks = v.parse().map_err(|_| format!("bad tick count: {v}"))?;
            }
            "--walk" => {
                walk = match args.next().as_deref() {
                    Some("left") => MoveIntent::LEFT,
                    Some("right") => MoveIntent::RIGHT,
                    Some("none") => MoveIntent::NONE,
                    other => return Err(format!("bad walk direction: {}", other.unwrap_or(""))),
                };
            }
            "--jump-at" => {
                let v = args.next().ok_or("--jump-at needs a tick")?;
                jump_at.push(v.parse().map_err(|_| format!("bad jump tick: {v}"))?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ if map.is_none() => map = Some(PathBuf::from(&arg)),
            _ => return Err(format!("unexpected argument {arg}")),
        }
    }

    let map = map.ok_or("missing map file")?;
    Ok(Script { map, ticks, walk, jump_at })
}

/// A map path that does not exist as given is looked up in the maps dir.
fn resolve_map_path(path: &Path, maps_dir: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    let candidate = maps_dir.join(path);
    if candidate.exists() { candidate } else { path.to_path_buf() }
}
