use eframe::egui::{self, Color32, RichText, Stroke, Ui};

use tender_dash::data::pipeline::Tile;

use crate::color::tile_colors;

// ---------------------------------------------------------------------------
// Summary tiles
// ---------------------------------------------------------------------------

/// One coloured tile: small label above a large value.
pub fn tile(ui: &mut Ui, tile: &Tile) {
    let colors = tile_colors(tile.kind);
    egui::Frame::default()
        .fill(colors.fill)
        .stroke(Stroke::new(1.5, colors.accent))
        .corner_radius(10.0)
        .inner_margin(14.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(&tile.label).size(13.0).color(Color32::WHITE));
            ui.label(
                RichText::new(&tile.value)
                    .size(22.0)
                    .strong()
                    .color(Color32::WHITE),
            );
        });
    ui.add_space(6.0);
}

/// Tiles side by side, one column each.
pub fn tile_row(ui: &mut Ui, tiles: &[Tile]) {
    if tiles.is_empty() {
        return;
    }
    ui.columns(tiles.len(), |cols: &mut [Ui]| {
        for (col, t) in cols.iter_mut().zip(tiles) {
            tile(col, t);
        }
    });
}

/// Stacked tile groups, `per_row` groups per row.
pub fn grouped_tiles(ui: &mut Ui, groups: &[(String, Vec<Tile>)], per_row: usize) {
    for chunk in groups.chunks(per_row.max(1)) {
        ui.columns(chunk.len(), |cols: &mut [Ui]| {
            for (col, (_, tiles)) in cols.iter_mut().zip(chunk) {
                for t in tiles {
                    tile(col, t);
                }
            }
        });
    }
}
