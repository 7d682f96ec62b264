//! Scrollable list of hourly steps with the active one highlighted.

use bevy_egui::egui;

use simulation::timeline::HourlySample;

use crate::water_canvas::band_color32;

pub(crate) fn step_label(sample: &HourlySample) -> String {
    format!(
        "Hour {:>3}  {:>3.0}%  {}",
        sample.hour,
        sample.probability * 100.0,
        sample.risk_band
    )
}

/// Draw the list. Returns the index the user clicked, if any.
pub(crate) fn step_list_ui(
    ui: &mut egui::Ui,
    samples: &[HourlySample],
    active: Option<usize>,
    follow_active: bool,
) -> Option<usize> {
    let mut clicked = None;
    egui::ScrollArea::vertical()
        .id_salt("flood_step_list")
        .max_height(260.0)
        .show(ui, |ui| {
            for (index, sample) in samples.iter().enumerate() {
                let is_active = active == Some(index);
                let text = egui::RichText::new(step_label(sample))
                    .monospace()
                    .color(band_color32(sample.risk_band));
                let response = ui.selectable_label(is_active, text);
                if is_active && follow_active {
                    response.scroll_to_me(Some(egui::Align::Center));
                }
                if response.clicked() {
                    clicked = Some(index);
                }
            }
        });
    clicked
}
