use bevy_egui::{egui, EguiContexts};

/// Dark slate palette with a water-blue accent.
pub fn apply_flood_theme(mut contexts: EguiContexts) {
    let ctx = contexts.ctx_mut();
    let mut style = (*ctx.style()).clone();

    let panel = egui::Color32::from_rgb(24, 30, 38);
    let inactive = egui::Color32::from_rgb(38, 48, 60);
    let hover = egui::Color32::from_rgb(52, 70, 92);
    let active = egui::Color32::from_rgb(40, 110, 200);

    style.visuals.widgets.noninteractive.bg_fill = panel;
    style.visuals.widgets.inactive.bg_fill = inactive;
    style.visuals.widgets.hovered.bg_fill = hover;
    style.visuals.widgets.active.bg_fill = active;
    style.visuals.widgets.inactive.weak_bg_fill = inactive;
    style.visuals.widgets.hovered.weak_bg_fill = hover;
    style.visuals.widgets.active.weak_bg_fill = active;

    style.visuals.window_fill = panel;
    style.visuals.panel_fill = panel;
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(16, 20, 26);
    style.visuals.faint_bg_color = egui::Color32::from_rgb(30, 36, 46);

    // Highlighted step in the list
    style.visuals.selection.bg_fill = active.linear_multiply(0.6);
    style.visuals.selection.stroke = egui::Stroke::new(1.0, active);

    let rounding = egui::CornerRadius::same(4);
    style.visuals.window_corner_radius = egui::CornerRadius::same(6);
    style.visuals.widgets.noninteractive.corner_radius = rounding;
    style.visuals.widgets.inactive.corner_radius = rounding;
    style.visuals.widgets.hovered.corner_radius = rounding;
    style.visuals.widgets.active.corner_radius = rounding;

    ctx.set_style(style);
}
