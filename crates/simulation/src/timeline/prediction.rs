//! Server-computed timelines.
//!
//! The prediction service runs the flood model once per simulated hour and
//! returns `{"timeline": [HourlySample...]}`. The engine trusts that payload
//! verbatim: no reordering, no gap filling, no reclassification.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PredictionEndpoint;

use super::{HourlySample, Timeline};

// =============================================================================
// Request types
// =============================================================================

/// Weather features accepted by the prediction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInput {
    pub temperature: f64,
    pub temperature_max: f64,
    pub temperature_min: f64,
    /// Surface pressure (hPa).
    pub pressure: f64,
    /// Hourly rainfall (mm).
    pub rainfall: f64,
    /// Relative humidity (%).
    pub humidity: f64,
    /// Wind speed (m/s).
    pub wind_speed: f64,
    #[serde(default)]
    pub rain_anomaly: f64,
    #[serde(default)]
    pub temp_anomaly: f64,
}

impl Default for WeatherInput {
    fn default() -> Self {
        Self {
            temperature: 27.0,
            temperature_max: 31.0,
            temperature_min: 24.0,
            pressure: 1008.0,
            rainfall: 12.0,
            humidity: 85.0,
            wind_speed: 4.0,
            rain_anomaly: 0.0,
            temp_anomaly: 0.0,
        }
    }
}

/// Run request for prediction mode. Without an explicit input the engine
/// falls back to the base input supplied earlier by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionRequest {
    pub weather_input: Option<WeatherInput>,
}

// =============================================================================
// Errors
// =============================================================================

/// Failure while obtaining a timeline from the prediction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request never produced an HTTP response.
    Network(String),
    /// The service answered with a non-success status.
    Status { status: u16, detail: Option<String> },
    /// The body was not a `{"timeline": [...]}` payload.
    MalformedPayload(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Network(msg) => write!(f, "Network error: {msg}"),
            RequestError::Status {
                status,
                detail: Some(detail),
            } => write!(f, "{detail} ({status})"),
            RequestError::Status {
                status,
                detail: None,
            } => write!(f, "Request failed ({status})"),
            RequestError::MalformedPayload(msg) => write!(f, "Malformed timeline payload: {msg}"),
        }
    }
}

impl std::error::Error for RequestError {}

// =============================================================================
// Payload parsing
// =============================================================================

/// Parse a successful response body into a timeline.
pub fn parse_timeline_payload(body: &str) -> Result<Timeline, RequestError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RequestError::MalformedPayload(format!("invalid JSON: {e}")))?;

    let Some(field) = value.get("timeline") else {
        return Err(RequestError::MalformedPayload(
            "missing `timeline` field".to_string(),
        ));
    };
    if !field.is_array() {
        return Err(RequestError::MalformedPayload(
            "`timeline` is not an array".to_string(),
        ));
    }

    let samples: Vec<HourlySample> = serde_json::from_value(field.clone())
        .map_err(|e| RequestError::MalformedPayload(format!("bad sample: {e}")))?;
    Ok(Timeline::new(samples))
}

/// Extract the human-readable message from an error body (`detail`, then
/// `error`). Returns `None` for non-JSON bodies or when neither is a string.
pub fn parse_error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

// =============================================================================
// Client seam
// =============================================================================

/// Anything that can turn a weather input into an hourly timeline.
///
/// Implementations may block; the plugin calls them from the IO task pool.
pub trait PredictionClient: Send + Sync + 'static {
    fn simulate(&self, input: &WeatherInput, hours: u32) -> Result<Timeline, RequestError>;
}

/// Shared handle to the prediction client used by every engine in the app.
#[derive(Resource, Clone)]
pub struct PredictionService(pub Arc<dyn PredictionClient>);

impl PredictionService {
    pub fn new(client: impl PredictionClient) -> Self {
        Self(Arc::new(client))
    }

    /// The default client for this target, pointed at `endpoint`.
    pub fn for_endpoint(endpoint: &PredictionEndpoint) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::new(HttpPredictionClient::new(endpoint.clone()))
        }
        #[cfg(target_arch = "wasm32")]
        {
            Self::new(UnreachableClient(endpoint.simulate_url()))
        }
    }
}

/// Blocking HTTP client for `POST {base}/simulate`.
#[cfg(not(target_arch = "wasm32"))]
pub struct HttpPredictionClient {
    endpoint: PredictionEndpoint,
    agent: ureq::Agent,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpPredictionClient {
    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

    pub fn new(endpoint: PredictionEndpoint) -> Self {
        Self {
            endpoint,
            agent: ureq::AgentBuilder::new().timeout(Self::TIMEOUT).build(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PredictionClient for HttpPredictionClient {
    fn simulate(&self, input: &WeatherInput, hours: u32) -> Result<Timeline, RequestError> {
        let url = self.endpoint.simulate_url();
        debug!("POST {} ({} h)", url, hours);
        let body = serde_json::json!({ "input": input, "hours": hours });

        match self.agent.post(&url).send_json(body) {
            Ok(response) => {
                let text = response
                    .into_string()
                    .map_err(|e| RequestError::MalformedPayload(format!("unreadable body: {e}")))?;
                parse_timeline_payload(&text)
            }
            Err(ureq::Error::Status(status, response)) => {
                let detail = response
                    .into_string()
                    .ok()
                    .and_then(|body| parse_error_detail(&body));
                Err(RequestError::Status { status, detail })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RequestError::Network(transport.to_string()))
            }
        }
    }
}

/// Browser builds have no blocking HTTP stack; every request fails fast.
#[cfg(target_arch = "wasm32")]
struct UnreachableClient(String);

#[cfg(target_arch = "wasm32")]
impl PredictionClient for UnreachableClient {
    fn simulate(&self, _input: &WeatherInput, _hours: u32) -> Result<Timeline, RequestError> {
        Err(RequestError::Network(format!(
            "{} is not reachable from this build",
            self.0
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskBand;

    #[test]
    fn test_parse_valid_payload_verbatim() {
        let body = r#"{"timeline":[
            {"hour":0,"probability":0.12,"risk_state":"LOW"},
            {"hour":5,"probability":0.91,"risk_state":"CRITICAL"},
            {"hour":2,"probability":0.40,"risk_state":"HIGH"}
        ]}"#;
        let timeline = parse_timeline_payload(body).unwrap();
        assert_eq!(timeline.len(), 3);
        // Order and hours untouched.
        assert_eq!(timeline[1].hour, 5);
        assert_eq!(timeline[2].hour, 2);
        // Band kept even though 0.40 would classify as MODERATE locally.
        assert_eq!(timeline[2].risk_band, RiskBand::High);
    }

    #[test]
    fn test_parse_rejects_non_array_timeline() {
        let err = parse_timeline_payload(r#"{"timeline":{"hour":0}}"#).unwrap_err();
        assert!(matches!(err, RequestError::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_rejects_missing_timeline() {
        let err = parse_timeline_payload(r#"{"result":[]}"#).unwrap_err();
        assert!(matches!(err, RequestError::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_rejects_bad_samples_and_bad_json() {
        assert!(matches!(
            parse_timeline_payload(r#"{"timeline":[{"hour":"x"}]}"#),
            Err(RequestError::MalformedPayload(_))
        ));
        assert!(matches!(
            parse_timeline_payload("<html>"),
            Err(RequestError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_parse_empty_timeline_is_ok() {
        let timeline = parse_timeline_payload(r#"{"timeline":[]}"#).unwrap();
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_error_detail_prefers_detail_then_error() {
        assert_eq!(
            parse_error_detail(r#"{"detail":"model not loaded","error":"x"}"#),
            Some("model not loaded".to_string())
        );
        assert_eq!(
            parse_error_detail(r#"{"error":"bad input"}"#),
            Some("bad input".to_string())
        );
        assert_eq!(parse_error_detail("Internal Server Error"), None);
        assert_eq!(parse_error_detail(r#"{"detail":[1,2]}"#), None);
    }

    #[test]
    fn test_status_error_display() {
        let with_detail = RequestError::Status {
            status: 500,
            detail: Some("model crashed".into()),
        };
        assert_eq!(with_detail.to_string(), "model crashed (500)");
        let bare = RequestError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(bare.to_string(), "Request failed (502)");
    }

    #[test]
    fn test_weather_input_anomalies_default_to_zero() {
        let input: WeatherInput = serde_json::from_str(
            r#"{"temperature":20,"temperature_max":25,"temperature_min":15,
                "pressure":1000,"rainfall":40,"humidity":90,"wind_speed":3}"#,
        )
        .unwrap();
        assert_eq!(input.rain_anomaly, 0.0);
        assert_eq!(input.temp_anomaly, 0.0);
    }
}
