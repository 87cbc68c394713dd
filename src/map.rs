/// Map loader: editor output → `TerrainModel` + spawn list.
///
/// ## Files
///
///   maps/
///     junction_slope.json   the map itself
///     tile_manifest.json    tile ids → sprite path / solidity
///     sprites/              sprite PNGs referenced by the manifest
///
/// ## Map format (JSON)
///   ```json
///   {
///     "lines":     [{ "p1": [0, 500], "p2": [100, 500], "type": "floor" }],
///     "tiles":     [[0, 0, 3], [1, 1, 1]],
///     "tile_size": [90, 60],
///     "bounds":    [0, 1280, 0, 720],
///     "spawns":    [{ "kind": "player", "x": 50, "y": 460, "width": 50, "height": 80 }]
///   }
///   ```
/// Every key is optional. `bounds` is `[min_x, max_x, min_y, max_y]`; when
/// absent the terrain derives its own box. Spawn `(x, y)` is the rect centre.
///
/// ## Tile placement
///
/// A sprite smaller than its cell is centred horizontally. Vertically it
/// follows its opaque pixels:
///
/// ┌──────────────────────┬──────────────┬──────────────────────────────┐
/// │ Opaque pixels        │ Alignment    │ Solid part starts at          │
/// ├──────────────────────┼──────────────┼──────────────────────────────┤
/// │ more in upper half   │ top          │ sprite top                    │
/// │ more in lower half   │ bottom       │ first row > width/10 opaque   │
/// │ equal                │ centre       │ sprite top                    │
/// └──────────────────────┴──────────────┴──────────────────────────────┘
///
/// Tiles without a sprite occupy the whole cell. Labels starting with
/// `slope` become slope tiles (surface read from the sprite); other solid
/// tiles become solid rects; non-solid tiles are scenery and are dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::SimConfig;
use crate::domain::geometry::Rect;
use crate::domain::slope::AlphaMask;
use crate::domain::terrain::{build_terrain, LineDef, MapBounds, SlopeDef, TerrainModel};

pub const MANIFEST_FILE: &str = "tile_manifest.json";
pub const SPRITES_DIR: &str = "sprites";
const SLOPE_LABEL_PREFIX: &str = "slope";

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(feature = "sprites")]
    #[error("cannot decode sprite {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("tile id {id} at row {row}, column {col} is not in the tile manifest")]
    UnknownTile { id: u32, row: usize, col: usize },
}

// ══════════════════════════════════════════════════════════════
// File schema
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Player,
    Mob,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Spawn {
    pub kind: SpawnKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub patrol_radius: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct MapFile {
    #[serde(default)]
    pub lines: Vec<LineDef>,
    #[serde(default)]
    pub tiles: Vec<Vec<u32>>,
    #[serde(default = "default_tile_size")]
    pub tile_size: [f32; 2],
    #[serde(default)]
    pub bounds: Option<[f32; 4]>,
    #[serde(default)]
    pub spawns: Vec<Spawn>,
}

fn default_tile_size() -> [f32; 2] { [90.0, 60.0] }
fn default_solid() -> bool { true }

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TileEntry {
    pub id: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_solid")]
    pub solid: bool,
}

impl TileEntry {
    pub fn is_slope(&self) -> bool {
        self.label.to_ascii_lowercase().starts_with(SLOPE_LABEL_PREFIX)
    }
}

#[derive(Deserialize)]
struct ManifestFile {
    #[serde(default)]
    tiles: Vec<TileEntry>,
}

/// Tile definitions by id. Id 0 is always the empty tile.
#[derive(Clone, Debug)]
pub struct TileManifest {
    entries: BTreeMap<u32, TileEntry>,
}

impl Default for TileManifest {
    fn default() -> Self {
        let empty = TileEntry { id: 0, label: "Empty".into(), path: None, solid: false };
        TileManifest { entries: BTreeMap::from([(0, empty)]) }
    }
}

impl TileManifest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let file: ManifestFile = serde_json::from_str(text)?;
        let mut manifest = TileManifest::default();
        for entry in file.tiles.into_iter().filter(|e| e.id != 0) {
            manifest.entries.insert(entry.id, entry);
        }
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        let text = read_text(path)?;
        Self::parse(&text).map_err(|source| MapError::Json { path: path.to_path_buf(), source })
    }

    pub fn get(&self, id: u32) -> Option<&TileEntry> {
        self.entries.get(&id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TileEntry> {
        self.entries.values()
    }
}

/// Everything a `World` needs from one map.
#[derive(Clone, Debug)]
pub struct LoadedMap {
    pub terrain: TerrainModel,
    pub spawns: Vec<Spawn>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load a map file plus the manifest and sprites next to it.
pub fn load_map(path: &Path, cfg: &SimConfig) -> Result<LoadedMap, MapError> {
    let text = read_text(path)?;
    let file: MapFile =
        serde_json::from_str(&text).map_err(|source| MapError::Json { path: path.to_path_buf(), source })?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest = if manifest_path.is_file() {
        TileManifest::load(&manifest_path)?
    } else {
        log::warn!("map: {} missing, only empty tiles are known", manifest_path.display());
        TileManifest::default()
    };
    let masks = load_masks(&manifest, &dir.join(SPRITES_DIR))?;

    let map = assemble(file, &manifest, &masks, cfg)?;
    log::info!(
        "map {} loaded: {} segments, {} slope tiles, {} solid tiles, {} spawns",
        path.display(),
        map.terrain.segments().len(),
        map.terrain.slope_tiles().len(),
        map.terrain.solid_tiles().len(),
        map.spawns.len()
    );
    Ok(map)
}

/// Turn a parsed map into terrain. `masks` holds decoded sprites by tile id.
pub fn assemble(
    file: MapFile,
    manifest: &TileManifest,
    masks: &BTreeMap<u32, AlphaMask>,
    cfg: &SimConfig,
) -> Result<LoadedMap, MapError> {
    let [cell_w, cell_h] = file.tile_size;
    let mut solids = Vec::new();
    let mut slopes = Vec::new();

    for (row, cells) in file.tiles.iter().enumerate() {
        for (col, &id) in cells.iter().enumerate() {
            if id == 0 {
                continue;
            }
            let entry = manifest.get(id).ok_or(MapError::UnknownTile { id, row, col })?;
            let cell_x = col as f32 * cell_w;
            let cell_y = row as f32 * cell_h;
            let mask = masks.get(&id);

            if entry.is_slope() {
                if let Some(mask) = mask {
                    let p = place_sprite(mask, cell_w, cell_h);
                    let rect = Rect::new(cell_x + p.offset_x, cell_y + p.offset_y, p.width, p.height);
                    slopes.push(SlopeDef { rect, mask: mask.clone() });
                    continue;
                }
                log::warn!("map: slope tile {id} at ({row}, {col}) has no sprite, using its cell");
            }
            if !entry.solid {
                continue;
            }

            let rect = match mask {
                Some(mask) => {
                    let p = place_sprite(mask, cell_w, cell_h);
                    Rect::new(
                        cell_x + p.offset_x,
                        cell_y + p.offset_y + p.solid_top,
                        p.width,
                        (p.height - p.solid_top).max(1.0),
                    )
                }
                None => Rect::new(cell_x, cell_y, cell_w, cell_h),
            };
            solids.push(rect);
        }
    }

    let bounds = file
        .bounds
        .map(|[min_x, max_x, min_y, max_y]| MapBounds { min_x, max_x, min_y, max_y });
    let terrain = build_terrain(&file.lines, &solids, &slopes, bounds, cfg.junction.snap_tolerance);
    Ok(LoadedMap { terrain, spawns: file.spawns })
}

/// Sprite position inside its cell and the row its solid part starts at,
/// all in pixels relative to the cell / sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    pub solid_top: f32,
}

pub fn place_sprite(mask: &AlphaMask, cell_w: f32, cell_h: f32) -> Placement {
    let (w, h) = (mask.width(), mask.height());
    let half = h / 2;
    let upper = mask.count_rows(0, half);
    let lower = mask.count_rows(half, h);

    let (offset_y, solid_top) = if upper > lower {
        (0.0, 0)
    } else if lower > upper {
        let dense = (0..h).find(|&r| mask.count_rows(r, r + 1) > w / 10).unwrap_or(h);
        (cell_h - h as f32, dense)
    } else {
        (((cell_h - h as f32) / 2.0).floor(), 0)
    };

    Placement {
        offset_x: ((cell_w - w as f32) / 2.0).floor(),
        offset_y,
        width: w as f32,
        height: h as f32,
        solid_top: solid_top as f32,
    }
}

// ══════════════════════════════════════════════════════════════
// File access
// ══════════════════════════════════════════════════════════════

fn read_text(path: &Path) -> Result<String, MapError> {
    std::fs::read_to_string(path).map_err(|source| MapError::Io { path: path.to_path_buf(), source })
}

/// Decode every sprite the manifest names. Missing files are warned about
/// and skipped; their tiles fall back to full cells.
#[cfg(feature = "sprites")]
fn load_masks(manifest: &TileManifest, dir: &Path) -> Result<BTreeMap<u32, AlphaMask>, MapError> {
    let mut masks = BTreeMap::new();
    for entry in manifest.entries() {
        let Some(rel) = entry.path.as_deref().filter(|p| !p.is_empty()) else { continue };
        let path = dir.join(rel);
        if !path.is_file() {
            log::warn!("map: sprite for tile {} missing: {}", entry.id, path.display());
            continue;
        }
        let img = image::open(&path)
            .map_err(|source| MapError::Image { path: path.clone(), source })?
            .to_rgba8();
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            continue;
        }
        let alpha: Vec<u8> = img.pixels().map(|p| p.0[3]).collect();
        masks.insert(entry.id, AlphaMask::from_alpha(w as usize, h as usize, &alpha));
    }
    Ok(masks)
}

#[cfg(not(feature = "sprites"))]
fn load_masks(manifest: &TileManifest, _dir: &Path) -> Result<BTreeMap<u32, AlphaMask>, MapError> {
    if manifest.entries().any(|e| e.path.is_some()) {
        log::warn!("map: built without sprite support, tiles use full cells");
    }
    Ok(BTreeMap::new())
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
