//! Scripted prediction service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::timeline::{PredictionClient, RequestError, Timeline, WeatherInput};

/// Answers every request with the same canned result and records what it
/// was asked.
#[derive(Clone)]
pub struct StubPrediction {
    response: Result<Timeline, RequestError>,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(WeatherInput, u32)>>>,
}

impl StubPrediction {
    pub fn returning(timeline: Timeline) -> Self {
        Self::new(Ok(timeline))
    }

    pub fn failing(error: RequestError) -> Self {
        Self::new(Err(error))
    }

    /// HTTP error response without a detail message.
    pub fn http_status(status: u16) -> Self {
        Self::failing(RequestError::Status {
            status,
            detail: None,
        })
    }

    pub fn unreachable() -> Self {
        Self::failing(RequestError::Network("no prediction service in tests".into()))
    }

    fn new(response: Result<Timeline, RequestError>) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared counter; clone it before handing the stub to the dashboard.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn last_request(&self) -> Arc<Mutex<Option<(WeatherInput, u32)>>> {
        Arc::clone(&self.last_request)
    }
}

impl PredictionClient for StubPrediction {
    fn simulate(&self, input: &WeatherInput, hours: u32) -> Result<Timeline, RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some((input.clone(), hours));
        }
        self.response.clone()
    }
}
