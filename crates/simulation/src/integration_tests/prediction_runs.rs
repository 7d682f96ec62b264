//! Prediction-mode runs through the IO task pool with a scripted service.

use std::sync::atomic::Ordering;

use crate::config::PREDICTION_HORIZON_HOURS;
use crate::engine::{EngineError, RunRequest, SimulationMode};
use crate::playback::PlaybackPhase;
use crate::risk::RiskBand;
use crate::systems::EngineAction;
use crate::test_harness::{StubPrediction, TestDashboard};
use crate::timeline::{HourlySample, PredictionRequest, RequestError, Timeline, WeatherInput};

fn predict(input: Option<WeatherInput>) -> EngineAction {
    EngineAction::Run(RunRequest::Prediction(PredictionRequest {
        weather_input: input,
    }))
}

fn server_timeline() -> Timeline {
    Timeline::new(vec![
        HourlySample {
            hour: 0,
            probability: 0.62,
            risk_band: RiskBand::High,
        },
        HourlySample {
            hour: 3,
            probability: 0.35,
            risk_band: RiskBand::Critical,
        },
        HourlySample {
            hour: 1,
            probability: 0.10,
            risk_band: RiskBand::Low,
        },
    ])
}

#[test]
fn test_http_500_surfaces_request_error_and_stays_idle() {
    let mut dashboard = TestDashboard::new().with_prediction(StubPrediction::http_status(500));
    let engine = dashboard.spawn_engine(31);

    dashboard.send(engine, predict(Some(WeatherInput::default())));
    let failed = dashboard.tick_until(50, |d| !d.log().failed.is_empty());
    assert!(failed, "the failure should be reported");

    let failure = &dashboard.log().failed[0];
    assert_eq!(failure.engine, engine);
    assert_eq!(
        failure.error,
        EngineError::Request(RequestError::Status {
            status: 500,
            detail: None
        })
    );
    dashboard.assert_phase(engine, PlaybackPhase::Idle);
    assert_eq!(dashboard.engine(engine).audio().voices_started(), 0);
    assert!(!dashboard.has_pending_prediction(engine));
    assert!(dashboard.log().loaded.is_empty());
}

#[test]
fn test_server_timeline_is_played_verbatim() {
    let stub = StubPrediction::returning(server_timeline());
    let last_request = stub.last_request();
    let mut dashboard = TestDashboard::new().with_prediction(stub);
    let engine = dashboard.spawn_engine(32);

    let input = WeatherInput {
        rainfall: 120.0,
        humidity: 97.0,
        ..WeatherInput::default()
    };
    dashboard.send(engine, predict(Some(input.clone())));
    assert!(dashboard.tick_until(50, |d| !d.log().loaded.is_empty()));

    assert_eq!(dashboard.log().loaded[0].samples, 3);
    let engine_ref = dashboard.engine(engine);
    assert_eq!(engine_ref.mode(), SimulationMode::Prediction);
    assert_eq!(engine_ref.timeline(), &server_timeline());
    assert_eq!(engine_ref.state().phase, PlaybackPhase::Playing);

    let sent = last_request.lock().unwrap().clone();
    assert_eq!(sent, Some((input, PREDICTION_HORIZON_HOURS)));
}

#[test]
fn test_server_band_drives_the_warning_tone() {
    let mut dashboard =
        TestDashboard::new().with_prediction(StubPrediction::returning(server_timeline()));
    let engine = dashboard.spawn_engine(33);
    dashboard.send(engine, predict(Some(WeatherInput::default())));
    assert!(dashboard.tick_until(50, |d| !d.log().loaded.is_empty()));
    assert!(dashboard.engine(engine).audio().warning().is_none());

    // Index 1 is labelled CRITICAL by the server at p = 0.35.
    dashboard.send(engine, EngineAction::Seek(1));
    dashboard.tick(1);
    assert!(dashboard.engine(engine).audio().warning().is_some());
}

#[test]
fn test_missing_input_is_rejected_without_a_request() {
    let stub = StubPrediction::returning(server_timeline());
    let calls = stub.calls();
    let mut dashboard = TestDashboard::new().with_prediction(stub);
    let engine = dashboard.spawn_engine(34);

    dashboard.send(engine, predict(None));
    dashboard.tick(5);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(dashboard.log().failed.len(), 1);
    assert_eq!(dashboard.log().failed[0].error, EngineError::MissingInput);
    assert!(!dashboard.has_pending_prediction(engine));
    assert_eq!(dashboard.engine(engine).mode(), SimulationMode::Sandbox);
}

#[test]
fn test_base_input_from_host_is_used() {
    let stub = StubPrediction::returning(server_timeline());
    let last_request = stub.last_request();
    let mut dashboard = TestDashboard::new().with_prediction(stub);
    let engine = dashboard.spawn_engine(35);

    let base = WeatherInput {
        pressure: 990.0,
        ..WeatherInput::default()
    };
    dashboard.send(engine, EngineAction::SetBaseInput(base.clone()));
    dashboard.send(engine, predict(None));
    assert!(dashboard.tick_until(50, |d| !d.log().loaded.is_empty()));

    let sent = last_request.lock().unwrap().clone().map(|(input, _)| input);
    assert_eq!(sent, Some(base));
}

#[test]
fn test_mode_switch_cancels_in_flight_request() {
    let mut dashboard =
        TestDashboard::new().with_prediction(StubPrediction::returning(server_timeline()));
    let engine = dashboard.spawn_engine(36);

    // Same frame: the fetch is started and immediately abandoned.
    dashboard.send(engine, predict(Some(WeatherInput::default())));
    dashboard.send(engine, EngineAction::SwitchMode(SimulationMode::Sandbox));
    dashboard.tick(10);

    assert!(dashboard.log().loaded.is_empty());
    assert!(!dashboard.has_pending_prediction(engine));
    assert!(!dashboard.engine(engine).is_awaiting_prediction());
    assert!(dashboard.engine(engine).timeline().is_empty());
    assert_eq!(dashboard.engine(engine).mode(), SimulationMode::Sandbox);
}

#[test]
fn test_engine_recovers_after_a_failed_prediction() {
    let mut dashboard = TestDashboard::new().with_prediction(StubPrediction::failing(
        RequestError::MalformedPayload("`timeline` is not an array".into()),
    ));
    let engine = dashboard.spawn_engine(37);
    dashboard.send(engine, predict(Some(WeatherInput::default())));
    assert!(dashboard.tick_until(50, |d| !d.log().failed.is_empty()));

    dashboard.send(
        engine,
        EngineAction::Run(RunRequest::Sandbox(Default::default())),
    );
    dashboard.tick(1);
    dashboard.assert_phase(engine, PlaybackPhase::Playing);
    assert_eq!(dashboard.engine(engine).mode(), SimulationMode::Sandbox);
}
