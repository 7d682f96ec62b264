//! Water-column canvas: a tank whose fill height is the smoothed level.

use bevy_egui::egui;

use simulation::risk::RiskBand;

pub(crate) const CANVAS_WIDTH: f32 = 160.0;
pub(crate) const CANVAS_HEIGHT: f32 = 220.0;

/// Threshold marks drawn on the tank wall.
const BAND_MARKS: [(f32, RiskBand); 3] = [
    (0.3, RiskBand::Moderate),
    (0.5, RiskBand::High),
    (0.7, RiskBand::Critical),
];

/// Convert a band's display color for egui.
pub(crate) fn band_color32(band: RiskBand) -> egui::Color32 {
    let c = band.color().to_srgba();
    egui::Color32::from_rgb(
        (c.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (c.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (c.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// The filled part of `tank` for `level` in `[0, 1]`, anchored at the bottom.
pub(crate) fn water_rect(tank: egui::Rect, level: f32) -> egui::Rect {
    let level = if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let top = tank.max.y - tank.height() * level;
    egui::Rect::from_min_max(egui::pos2(tank.min.x, top), tank.max)
}

/// Draw one frame of the column. Returns the size actually allocated, which
/// the caller compares against the previous frame to detect resizes.
pub(crate) fn draw_water_column(ui: &mut egui::Ui, level: f32, band: RiskBand) -> egui::Vec2 {
    let height = ui.available_height().clamp(120.0, CANVAS_HEIGHT);
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(CANVAS_WIDTH, height), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(30));

    let water = water_rect(rect.shrink(4.0), level);
    let tint = band_color32(band).linear_multiply(0.35);
    painter.rect_filled(water, 2.0, egui::Color32::from_rgb(40, 110, 200));
    painter.rect_filled(water, 2.0, tint);

    for (threshold, mark_band) in BAND_MARKS {
        let y = water_rect(rect.shrink(4.0), threshold).min.y;
        painter.line_segment(
            [egui::pos2(rect.min.x, y), egui::pos2(rect.min.x + 12.0, y)],
            egui::Stroke::new(2.0, band_color32(mark_band)),
        );
    }

    painter.text(
        rect.center_top() + egui::vec2(0.0, 12.0),
        egui::Align2::CENTER_CENTER,
        format!("{:.0}%", level * 100.0),
        egui::FontId::proportional(16.0),
        egui::Color32::WHITE,
    );

    rect.size()
}
