use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Lighten, Srgb};

use tender_dash::data::pipeline::TileKind;

// ---------------------------------------------------------------------------
// Tile colours
// ---------------------------------------------------------------------------

/// Amount tiles: material blue 600.
const AMOUNT_BASE: u32 = 0x1e88e5;
/// Secondary tiles: material green 600.
const SECONDARY_BASE: u32 = 0x43a047;

/// Fill plus a lighter accent for the border, standing in for a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileColors {
    pub fill: Color32,
    pub accent: Color32,
}

pub fn tile_colors(kind: TileKind) -> TileColors {
    let base = match kind {
        TileKind::Amount => AMOUNT_BASE,
        TileKind::Secondary => SECONDARY_BASE,
    };
    TileColors {
        fill: shade(base, 0.0),
        accent: shade(base, 0.25),
    }
}

/// `rgb` lightened in HSL space by `amount` (0 = unchanged).
fn shade(rgb: u32, amount: f32) -> Color32 {
    let srgb: Srgb = Srgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8).into_format();
    let hsl: Hsl = srgb.into_color();
    let out: Srgb = hsl.lighten(amount).into_color();
    Color32::from_rgb(
        (out.red * 255.0).round() as u8,
        (out.green * 255.0).round() as u8,
        (out.blue * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unshaded_base_round_trips() {
        assert_eq!(tile_colors(TileKind::Amount).fill, Color32::from_rgb(0x1e, 0x88, 0xe5));
    }

    #[test]
    fn accent_is_lighter() {
        let c = tile_colors(TileKind::Secondary);
        let sum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(sum(c.accent) > sum(c.fill));
    }
}
