//! Flood simulation panel: data source, run controls, transport, the water
//! column and the step list. One egui window per engine entity carrying a
//! [`DashboardPanel`].

use std::ops::RangeInclusive;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use simulation::audio::{AudioContextState, AudioFeedback};
use simulation::engine::RunRequest;
use simulation::playback::PlaybackPhase;
use simulation::risk::RiskBand;
use simulation::timeline::{PredictionRequest, SandboxRequest, WeatherInput};
use simulation::{
    EngineAction, EngineCommand, RunFailed, SimulationEngine, SimulationMode, TimelineLoaded,
    WaterLevel,
};

use crate::step_list::step_list_ui;
use crate::water_canvas::{band_color32, draw_water_column};

// =============================================================================
// Components
// =============================================================================

/// Form state and status line of one panel, stored next to its engine.
#[derive(Component, Debug, Clone)]
pub struct DashboardPanel {
    pub title: String,
    pub mode: SimulationMode,
    pub base_percent: u8,
    pub duration_hours: u32,
    pub weather: WeatherInput,
    /// Keep the active step scrolled into view.
    pub follow_playhead: bool,
    /// Last run error, shown until the next successful load.
    pub status: Option<String>,
    canvas_size: Option<egui::Vec2>,
}

impl Default for DashboardPanel {
    fn default() -> Self {
        let sandbox = SandboxRequest::default();
        Self {
            title: "Flood simulation".to_string(),
            mode: SimulationMode::Sandbox,
            base_percent: sandbox.base_probability_percent(),
            duration_hours: sandbox.duration_hours(),
            weather: WeatherInput::default(),
            follow_playhead: true,
            status: None,
            canvas_size: None,
        }
    }
}

impl DashboardPanel {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The run the form currently describes.
    pub fn run_request(&self) -> RunRequest {
        match self.mode {
            SimulationMode::Sandbox => {
                RunRequest::Sandbox(SandboxRequest::new(self.base_percent, self.duration_hours))
            }
            SimulationMode::Prediction => RunRequest::Prediction(PredictionRequest {
                weather_input: Some(self.weather.clone()),
            }),
        }
    }

    /// Record this frame's canvas size; true when it differs from last frame.
    pub(crate) fn canvas_resized(&mut self, size: egui::Vec2) -> bool {
        let changed = self.canvas_size.is_some_and(|previous| previous != size);
        self.canvas_size = Some(size);
        changed
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Mirror run outcomes into the panels' status lines.
pub fn record_run_outcomes(
    mut loaded: EventReader<TimelineLoaded>,
    mut failed: EventReader<RunFailed>,
    mut panels: Query<&mut DashboardPanel>,
) {
    for event in loaded.read() {
        if let Ok(mut panel) = panels.get_mut(event.engine) {
            panel.status = None;
        }
    }
    for event in failed.read() {
        if let Ok(mut panel) = panels.get_mut(event.engine) {
            panel.status = Some(event.error.to_string());
        }
    }
}

pub fn dashboard_ui(
    mut contexts: EguiContexts,
    mut panels: Query<(
        Entity,
        &SimulationEngine,
        Option<&WaterLevel>,
        &mut DashboardPanel,
    )>,
    mut commands: EventWriter<EngineCommand>,
) {
    let ctx = contexts.ctx_mut();
    for (entity, engine, level, mut panel) in &mut panels {
        if !engine.is_mounted() {
            continue;
        }
        let level = level.map_or(engine.level(), |level| level.0);
        let mut actions = Vec::new();

        egui::Window::new(panel.title.clone())
            .id(egui::Id::new(("flood_panel", entity)))
            .default_width(540.0)
            .show(ctx, |ui| {
                panel_contents(ui, engine, level, &mut panel, &mut actions);
            });

        for action in actions {
            commands.send(EngineCommand::new(entity, action));
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

fn panel_contents(
    ui: &mut egui::Ui,
    engine: &SimulationEngine,
    level: f32,
    panel: &mut DashboardPanel,
    actions: &mut Vec<EngineAction>,
) {
    ui.spacing_mut().item_spacing.y = 6.0;

    // --- Data source ---
    ui.horizontal(|ui| {
        ui.label("Source:");
        for mode in [SimulationMode::Sandbox, SimulationMode::Prediction] {
            if ui
                .selectable_label(panel.mode == mode, mode.label())
                .clicked()
                && panel.mode != mode
            {
                panel.mode = mode;
                panel.status = None;
                actions.push(EngineAction::SwitchMode(mode));
            }
        }
    });

    ui.separator();
    match panel.mode {
        SimulationMode::Sandbox => sandbox_controls(ui, panel),
        SimulationMode::Prediction => weather_controls(ui, panel, actions),
    }
    ui.separator();

    // --- Transport ---
    let state = engine.state();
    let awaiting = engine.is_awaiting_prediction();
    ui.horizontal(|ui| {
        let run_label = if awaiting { "Fetching..." } else { "Run" };
        if ui
            .add_enabled(!awaiting, egui::Button::new(run_label))
            .clicked()
        {
            panel.status = None;
            actions.push(EngineAction::Run(panel.run_request()));
        }

        let play_label = if state.phase == PlaybackPhase::Playing {
            "Pause"
        } else {
            "Play"
        };
        if ui
            .add_enabled(
                can_toggle_play(state.phase, awaiting),
                egui::Button::new(play_label),
            )
            .clicked()
        {
            actions.push(EngineAction::TogglePlay);
        }

        let mut muted = state.muted;
        if ui
            .add_enabled(!awaiting, egui::Checkbox::new(&mut muted, "Mute"))
            .changed()
        {
            actions.push(EngineAction::SetMuted(muted));
        }
        ui.checkbox(&mut panel.follow_playhead, "Follow");
    });

    if let Some(status) = &panel.status {
        ui.colored_label(egui::Color32::from_rgb(240, 90, 90), status);
    }

    // --- Current step ---
    let timeline = engine.timeline();
    match engine.current_sample() {
        Some(sample) => {
            ui.colored_label(
                band_color32(sample.risk_band),
                format!(
                    "Step {}/{} (hour {}): {:.0}% flood probability, {}",
                    state.playhead + 1,
                    timeline.samples().len(),
                    sample.hour,
                    sample.probability * 100.0,
                    sample.risk_band
                ),
            );
        }
        None => {
            ui.label("No timeline loaded. Run a simulation to start.");
        }
    }
    ui.small(format!(
        "{}  |  {}",
        phase_label(state.phase),
        audio_status(engine.audio())
    ));

    ui.separator();

    // --- Water column + steps ---
    ui.horizontal_top(|ui| {
        let band = engine
            .current_sample()
            .map_or(RiskBand::Low, |sample| sample.risk_band);
        let size = draw_water_column(ui, level, band);
        if panel.canvas_resized(size) {
            actions.push(EngineAction::RestartRenderLoop);
        }

        ui.vertical(|ui| {
            let active = engine.current_sample().map(|_| state.playhead);
            if let Some(index) =
                step_list_ui(ui, timeline.samples(), active, panel.follow_playhead)
            {
                actions.push(EngineAction::Seek(index));
            }
        });
    });
}

fn sandbox_controls(ui: &mut egui::Ui, panel: &mut DashboardPanel) {
    ui.add(
        egui::Slider::new(&mut panel.base_percent, 0..=100)
            .text("base probability")
            .suffix("%"),
    );
    ui.add(
        egui::Slider::new(&mut panel.duration_hours, 1..=168)
            .text("duration")
            .suffix(" h"),
    );
}

fn weather_controls(ui: &mut egui::Ui, panel: &mut DashboardPanel, actions: &mut Vec<EngineAction>) {
    let weather = &mut panel.weather;
    egui::Grid::new("weather_input_grid")
        .num_columns(2)
        .show(ui, |ui| {
            weather_row(ui, "Temperature (°C)", &mut weather.temperature, -30.0..=55.0);
            weather_row(ui, "Max temperature (°C)", &mut weather.temperature_max, -30.0..=60.0);
            weather_row(ui, "Min temperature (°C)", &mut weather.temperature_min, -40.0..=50.0);
            weather_row(ui, "Pressure (hPa)", &mut weather.pressure, 870.0..=1085.0);
            weather_row(ui, "Rainfall (mm)", &mut weather.rainfall, 0.0..=500.0);
            weather_row(ui, "Humidity (%)", &mut weather.humidity, 0.0..=100.0);
            weather_row(ui, "Wind speed (m/s)", &mut weather.wind_speed, 0.0..=80.0);
            weather_row(ui, "Rain anomaly", &mut weather.rain_anomaly, -500.0..=500.0);
            weather_row(ui, "Temperature anomaly", &mut weather.temp_anomaly, -20.0..=20.0);
        });
    if ui.button("Use as base input").clicked() {
        actions.push(EngineAction::SetBaseInput(panel.weather.clone()));
    }
}

fn weather_row(ui: &mut egui::Ui, label: &str, value: &mut f64, range: RangeInclusive<f64>) {
    ui.label(label);
    ui.add(egui::DragValue::new(value).range(range).speed(0.1));
    ui.end_row();
}

/// Play/Pause needs a loaded timeline and no fetch in flight.
fn can_toggle_play(phase: PlaybackPhase, awaiting: bool) -> bool {
    phase != PlaybackPhase::Idle && !awaiting
}

fn phase_label(phase: PlaybackPhase) -> &'static str {
    match phase {
        PlaybackPhase::Idle => "Idle",
        PlaybackPhase::Ready => "Ready",
        PlaybackPhase::Playing => "Playing",
        PlaybackPhase::Paused => "Paused",
    }
}

fn audio_status(audio: &AudioFeedback) -> String {
    match audio.context() {
        AudioContextState::Uninitialized => "Audio starts with the first run".to_string(),
        AudioContextState::Unavailable => "Audio unavailable".to_string(),
        AudioContextState::Suspended => "Audio suspended".to_string(),
        AudioContextState::Running if audio.is_muted() => "Muted".to_string(),
        AudioContextState::Running => format!("{} voice(s)", audio.active_voices()),
    }
}
