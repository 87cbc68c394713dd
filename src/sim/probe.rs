/// Foot probes: the three x positions sampled under a body.

use crate::config::ProbeConfig;
use crate::domain::geometry::Rect;

/// Index of the centre probe in [`foot_probes`].
pub const CENTER: usize = 1;

/// Inset of the outer probes from the rect's sides.
pub fn foot_padding(rect: &Rect, cfg: &ProbeConfig) -> f32 {
    let divisor = if cfg.foot_padding_divisor > 0.0 { cfg.foot_padding_divisor } else { 6.0 };
    (rect.w / divisor).clamp(cfg.foot_padding_min, cfg.foot_padding_max.max(cfg.foot_padding_min))
}

/// `[left foot, centre, right foot]`.
pub fn foot_probes(rect: &Rect, cfg: &ProbeConfig) -> [f32; 3] {
    let pad = foot_padding(rect, cfg);
    [rect.left() + pad, rect.centerx(), rect.right() - pad]
}
