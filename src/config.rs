/// External configuration loader.
///
/// Reads `slopewalk.toml` from the executable's directory (or CWD).
/// Falls back to the tuned defaults if the file is missing or incomplete.
///
/// Every tolerance the resolver uses lives here so levels with unusual
/// authoring (big seams, steep ramps) can be tuned without a rebuild.

use serde::Deserialize;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "slopewalk.toml";

// ── Public Config Structs ──

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub junction: JunctionConfig,
    pub probe: ProbeConfig,
    pub step: StepConfig,
    pub guard: GuardConfig,
    pub motion: MotionConfig,
    pub maps_dir: PathBuf,
}

/// Endpoint clustering and seam smoothing.
#[derive(Clone, Debug, PartialEq)]
pub struct JunctionConfig {
    pub snap_tolerance: f32,        // endpoints closer than this are one junction
    pub endpoint_tolerance: f32,    // "probe is at this endpoint", flat segments
    pub sloped_endpoint_tolerance: f32,
    pub junction_scale: f32,        // sloped segments look this much further for junctions
    pub seam_tolerance: f32,        // larger seams are real steps, not blended
    pub center_blend_distance: f32, // blend range for the final centre sample
}

/// Foot probes and membership windows.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeConfig {
    pub foot_padding_min: f32,
    pub foot_padding_max: f32,
    pub foot_padding_divisor: f32,
    pub plain_extension: f32,
    pub current_extension: f32,
    pub connected_extension: f32,
}

/// Accept window for `surface_y - rect.bottom`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepConfig {
    pub max_slope_step_up: f32,
    pub max_slope_step_down: f32,
    pub plain_tolerance_bottom: f32,
    pub sloped_tolerance_bottom: f32,
    pub current_tolerance_bottom: f32,
    pub connected_tolerance_bottom: f32,
    pub junction_tolerance_bottom: f32,
}

/// Teleport guard.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardConfig {
    pub teleport_cap: f32,
    pub sloped_cap_floor: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_velocity: f32,
    pub player_speed: f32,
    pub mob_speed: f32,
    pub patrol_radius: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    junction: TomlJunction,
    #[serde(default)]
    probe: TomlProbe,
    #[serde(default)]
    step: TomlStep,
    #[serde(default)]
    guard: TomlGuard,
    #[serde(default)]
    motion: TomlMotion,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlJunction {
    #[serde(default = "default_snap")]
    snap_tolerance: f32,
    #[serde(default = "default_endpoint_tol")]
    endpoint_tolerance: f32,
    #[serde(default = "default_sloped_endpoint_tol")]
    sloped_endpoint_tolerance: f32,
    #[serde(default = "default_junction_scale")]
    junction_scale: f32,
    #[serde(default = "default_seam")]
    seam_tolerance: f32,
    #[serde(default = "default_center_blend")]
    center_blend_distance: f32,
}

#[derive(Deserialize, Debug)]
struct TomlProbe {
    #[serde(default = "default_padding_min")]
    foot_padding_min: f32,
    #[serde(default = "default_padding_max")]
    foot_padding_max: f32,
    #[serde(default = "default_padding_divisor")]
    foot_padding_divisor: f32,
    #[serde(default = "default_plain_ext")]
    plain_extension: f32,
    #[serde(default = "default_current_ext")]
    current_extension: f32,
    #[serde(default = "default_connected_ext")]
    connected_extension: f32,
}

#[derive(Deserialize, Debug)]
struct TomlStep {
    #[serde(default = "default_step_up")]
    max_slope_step_up: f32,
    #[serde(default = "default_step_down")]
    max_slope_step_down: f32,
    #[serde(default = "default_plain_tol")]
    plain_tolerance_bottom: f32,
    #[serde(default = "default_sloped_tol")]
    sloped_tolerance_bottom: f32,
    #[serde(default = "default_current_tol")]
    current_tolerance_bottom: f32,
    #[serde(default = "default_connected_tol")]
    connected_tolerance_bottom: f32,
    #[serde(default = "default_junction_tol")]
    junction_tolerance_bottom: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGuard {
    #[serde(default = "default_teleport_cap")]
    teleport_cap: f32,
    #[serde(default = "default_sloped_cap_floor")]
    sloped_cap_floor: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMotion {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f32,
    #[serde(default = "default_jump")]
    jump_velocity: f32,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_mob_speed")]
    mob_speed: f32,
    #[serde(default = "default_patrol_radius")]
    patrol_radius: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_maps_dir")]
    maps_dir: String,
}

// ── Defaults ──

fn default_snap() -> f32 { 5.0 }
fn default_endpoint_tol() -> f32 { 8.0 }
fn default_sloped_endpoint_tol() -> f32 { 12.0 }
fn default_junction_scale() -> f32 { 1.5 }
fn default_seam() -> f32 { 20.0 }
fn default_center_blend() -> f32 { 30.0 }

fn default_padding_min() -> f32 { 2.0 }
fn default_padding_max() -> f32 { 12.0 }
fn default_padding_divisor() -> f32 { 6.0 }
fn default_plain_ext() -> f32 { 15.0 }
fn default_current_ext() -> f32 { 40.0 }
fn default_connected_ext() -> f32 { 35.0 }

fn default_step_up() -> f32 { 60.0 }
fn default_step_down() -> f32 { 25.0 }
fn default_plain_tol() -> f32 { -2.0 }
fn default_sloped_tol() -> f32 { -35.0 }
fn default_current_tol() -> f32 { -20.0 }
fn default_connected_tol() -> f32 { -25.0 }
fn default_junction_tol() -> f32 { -15.0 }

fn default_teleport_cap() -> f32 { 50.0 }
fn default_sloped_cap_floor() -> f32 { 60.0 }

fn default_gravity() -> f32 { 0.75 }
fn default_max_fall() -> f32 { 10.0 }
fn default_jump() -> f32 { 11.0 }
fn default_player_speed() -> f32 { 3.0 }
fn default_mob_speed() -> f32 { 1.0 }
fn default_patrol_radius() -> f32 { 150.0 }

fn default_maps_dir() -> String { "maps".into() }

impl Default for TomlJunction {
    fn default() -> Self {
        TomlJunction {
            snap_tolerance: default_snap(),
            endpoint_tolerance: default_endpoint_tol(),
            sloped_endpoint_tolerance: default_sloped_endpoint_tol(),
            junction_scale: default_junction_scale(),
            seam_tolerance: default_seam(),
            center_blend_distance: default_center_blend(),
        }
    }
}

impl Default for TomlProbe {
    fn default() -> Self {
        TomlProbe {
            foot_padding_min: default_padding_min(),
            foot_padding_max: default_padding_max(),
            foot_padding_divisor: default_padding_divisor(),
            plain_extension: default_plain_ext(),
            current_extension: default_current_ext(),
            connected_extension: default_connected_ext(),
        }
    }
}

impl Default for TomlStep {
    fn default() -> Self {
        TomlStep {
            max_slope_step_up: default_step_up(),
            max_slope_step_down: default_step_down(),
            plain_tolerance_bottom: default_plain_tol(),
            sloped_tolerance_bottom: default_sloped_tol(),
            current_tolerance_bottom: default_current_tol(),
            connected_tolerance_bottom: default_connected_tol(),
            junction_tolerance_bottom: default_junction_tol(),
        }
    }
}

impl Default for TomlGuard {
    fn default() -> Self {
        TomlGuard {
            teleport_cap: default_teleport_cap(),
            sloped_cap_floor: default_sloped_cap_floor(),
        }
    }
}

impl Default for TomlMotion {
    fn default() -> Self {
        TomlMotion {
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
            jump_velocity: default_jump(),
            player_speed: default_player_speed(),
            mob_speed: default_mob_speed(),
            patrol_radius: default_patrol_radius(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            maps_dir: default_maps_dir(),
        }
    }
}

// ── Loading ──

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl SimConfig {
    /// Load config from `slopewalk.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        SimConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search). Unparseable text yields
    /// the defaults, as a broken file on disk would.
    pub fn from_toml_str(text: &str) -> Self {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("config parse error: {e}; using default settings");
                TomlConfig::default()
            }
        };
        SimConfig::from_toml(toml_cfg, &[])
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve maps directory
        let maps_dir_str = &toml_cfg.general.maps_dir;
        let maps_dir = if PathBuf::from(maps_dir_str).is_absolute() {
            PathBuf::from(maps_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(maps_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(maps_dir_str))
        };

        let j = toml_cfg.junction;
        let p = toml_cfg.probe;
        let s = toml_cfg.step;
        let g = toml_cfg.guard;
        let m = toml_cfg.motion;

        SimConfig {
            junction: JunctionConfig {
                snap_tolerance: j.snap_tolerance,
                endpoint_tolerance: j.endpoint_tolerance,
                sloped_endpoint_tolerance: j.sloped_endpoint_tolerance,
                junction_scale: j.junction_scale,
                seam_tolerance: j.seam_tolerance,
                center_blend_distance: j.center_blend_distance,
            },
            probe: ProbeConfig {
                foot_padding_min: p.foot_padding_min,
                foot_padding_max: p.foot_padding_max,
                foot_padding_divisor: p.foot_padding_divisor,
                plain_extension: p.plain_extension,
                current_extension: p.current_extension,
                connected_extension: p.connected_extension,
            },
            step: StepConfig {
                max_slope_step_up: s.max_slope_step_up,
                max_slope_step_down: s.max_slope_step_down,
                plain_tolerance_bottom: s.plain_tolerance_bottom,
                sloped_tolerance_bottom: s.sloped_tolerance_bottom,
                current_tolerance_bottom: s.current_tolerance_bottom,
                connected_tolerance_bottom: s.connected_tolerance_bottom,
                junction_tolerance_bottom: s.junction_tolerance_bottom,
            },
            guard: GuardConfig {
                teleport_cap: g.teleport_cap,
                sloped_cap_floor: g.sloped_cap_floor,
            },
            motion: MotionConfig {
                gravity: m.gravity,
                max_fall_speed: m.max_fall_speed,
                jump_velocity: m.jump_velocity,
                player_speed: m.player_speed,
                mob_speed: m.mob_speed,
                patrol_radius: m.patrol_radius,
            },
            maps_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for the config file in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::info!("config loaded from {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("{CONFIG_FILE} parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let c = SimConfig::default();
        assert_eq!(c.junction.snap_tolerance, 5.0);
        assert_eq!(c.step.max_slope_step_up, 60.0);
        assert_eq!(c.step.max_slope_step_down, 25.0);
        assert_eq!(c.guard.teleport_cap, 50.0);
        assert_eq!(c.probe.current_extension, 40.0);
        assert_eq!(c.maps_dir, PathBuf::from("maps"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = SimConfig::from_toml_str(
            "[guard]\nteleport_cap = 30.0\n\n[motion]\ngravity = 1.0\n",
        );
        assert_eq!(c.guard.teleport_cap, 30.0);
        assert_eq!(c.guard.sloped_cap_floor, 60.0);
        assert_eq!(c.motion.gravity, 1.0);
        assert_eq!(c.motion.jump_velocity, 11.0);
        assert_eq!(c.junction, SimConfig::default().junction);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let c = SimConfig::from_toml_str("[guard\nteleport_cap = ");
        assert_eq!(c, SimConfig::default());
    }
}
