/// Slope tiles: surface heights sampled from a sprite's opaque pixels.
///
/// Each pixel column of the sprite gets a top (first opaque row) and a bottom
/// (last opaque row). Columns with no opaque pixel borrow the profile of the
/// nearest defined column, searching outward (left first on a tie), so a
/// sprite with anti-aliased gaps still reads as one continuous surface.

use super::geometry::Rect;

/// Pixels with alpha above this count as opaque.
pub const ALPHA_THRESHOLD: u8 = 127;

/// Row-major opaque-pixel mask.
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaMask {
    width: usize,
    height: usize,
    opaque: Vec<bool>,
}

impl AlphaMask {
    /// `opaque.len()` must be `width * height`; shorter data reads as clear.
    pub fn new(width: usize, height: usize, opaque: Vec<bool>) -> Self {
        AlphaMask { width, height, opaque }
    }

    /// Build from one alpha byte per pixel, row-major.
    pub fn from_alpha(width: usize, height: usize, alpha: &[u8]) -> Self {
        let opaque = alpha.iter().map(|&a| a > ALPHA_THRESHOLD).collect();
        AlphaMask { width, height, opaque }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn is_opaque(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.opaque.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// Opaque pixels in rows `[from, to)`.
    pub fn count_rows(&self, from: usize, to: usize) -> usize {
        (from..to.min(self.height))
            .map(|y| (0..self.width).filter(|&x| self.is_opaque(x, y)).count())
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlopeTile {
    pub rect: Rect,
    /// Surface offset from `rect.top` per column (always defined after fill).
    pub column_top: Vec<f32>,
    /// Underside offset from `rect.top` per column.
    pub column_bottom: Vec<f32>,
}

impl SlopeTile {
    /// Derive the profile from a mask. `None` when nothing is opaque.
    pub fn from_mask(rect: Rect, mask: &AlphaMask) -> Option<Self> {
        let mut tops = Vec::with_capacity(mask.width());
        let mut bottoms = Vec::with_capacity(mask.width());
        for x in 0..mask.width() {
            let mut rows = (0..mask.height()).filter(|&y| mask.is_opaque(x, y));
            let top = rows.next();
            let bottom = rows.last().or(top);
            tops.push(top.map(|y| y as f32));
            bottoms.push(bottom.map(|y| y as f32 + 1.0));
        }
        let column_top = fill_nearest(&tops)?;
        let column_bottom = fill_nearest(&bottoms)?;
        Some(SlopeTile { rect, column_top, column_bottom })
    }

    /// Column under world `x`, if `x` is over this tile.
    pub fn column_at(&self, x: f32) -> Option<usize> {
        if !self.rect.contains_x(x) || self.column_top.is_empty() {
            return None;
        }
        let col = (x - self.rect.left()).floor() as usize;
        Some(col.min(self.column_top.len() - 1))
    }

    /// World-space surface height of a column.
    pub fn surface_at_column(&self, col: usize) -> Option<f32> {
        self.column_top.get(col).map(|off| self.rect.top() + off)
    }

    /// World-space surface height under `x`.
    pub fn surface_at(&self, x: f32) -> Option<f32> {
        self.surface_at_column(self.column_at(x)?)
    }
}

/// Fill `None` entries from the nearest defined neighbour (left wins ties).
/// `None` if no entry is defined.
fn fill_nearest(values: &[Option<f32>]) -> Option<Vec<f32>> {
    if values.iter().all(Option::is_none) {
        return None;
    }
    let n = values.len();
    let filled = (0..n)
        .map(|i| {
            if let Some(v) = values[i] {
                return v;
            }
            (1..n)
                .find_map(|d| {
                    let left = i.checked_sub(d).and_then(|j| values[j]);
                    let right = values.get(i + d).copied().flatten();
                    left.or(right)
                })
                .unwrap_or(0.0)
        })
        .collect();
    Some(filled)
}
