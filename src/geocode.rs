//! Place-name geocoding with a bounded, fixed-delay retry policy.

use crate::error::GeocodeError;
use crate::types::{coordinate, Coordinate};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// One lookup against a geocoding service.
///
/// `Ok(None)` is a clean "no such place" answer; `Err` is a failed call.
pub trait Geocoder {
    fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError> {
        (**self).lookup(place)
    }
}

/// Nominatim search client.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        parse_search_response(&resp.text()?)
    }
}

/// First hit of a search answer; an empty array is a clean no-match.
fn parse_search_response(body: &str) -> Result<Option<Coordinate>, GeocodeError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body).map_err(|e| GeocodeError::Decode {
        reason: e.to_string(),
    })?;
    let Some(hit) = hits.first() else {
        return Ok(None);
    };
    let parse = |field: &str, value: &str| {
        value.parse::<f64>().map_err(|e| GeocodeError::Decode {
            reason: format!("{} '{}': {}", field, value, e),
        })
    };
    Ok(Some(coordinate(parse("lat", &hit.lat)?, parse("lon", &hit.lon)?)))
}

/// A failed attempt, as reported on the diagnostics channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub place: String,
    pub attempt: u32, // 1-based
    pub error: String,
}

/// Receives advisory notices about failed lookup attempts. Must not fail.
pub trait Diagnostics {
    fn attempt_failed(&self, failure: &AttemptFailure);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn attempt_failed(&self, failure: &AttemptFailure) {
        (**self).attempt_failed(failure)
    }
}

/// Default channel: a warning in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn attempt_failed(&self, failure: &AttemptFailure) {
        warn!(
            place = %failure.place,
            attempt = failure.attempt,
            "Geocoding attempt {} failed: {}",
            failure.attempt,
            failure.error
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Final state of one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(Coordinate),
    NoMatch,
    Exhausted { attempts: u32 },
}

impl Resolution {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Resolution::Found(point) => Some(*point),
            Resolution::NoMatch | Resolution::Exhausted { .. } => None,
        }
    }
}

pub struct GeocodeResolver<G, D = LogDiagnostics> {
    geocoder: G,
    policy: RetryPolicy,
    diagnostics: D,
}

impl<G: Geocoder> GeocodeResolver<G, LogDiagnostics> {
    pub fn new(geocoder: G, policy: RetryPolicy) -> Self {
        Self::with_diagnostics(geocoder, policy, LogDiagnostics)
    }
}

impl<G: Geocoder, D: Diagnostics> GeocodeResolver<G, D> {
    pub fn with_diagnostics(geocoder: G, policy: RetryPolicy, diagnostics: D) -> Self {
        Self {
            geocoder,
            policy,
            diagnostics,
        }
    }

    /// Resolves `place`, retrying only failed calls. A clean no-match ends
    /// the loop immediately. Never fails.
    pub fn resolve(&self, place: &str) -> Resolution {
        let place = place.trim();
        if place.is_empty() {
            return Resolution::NoMatch;
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.geocoder.lookup(place) {
                Ok(Some(point)) => {
                    debug!("Resolved '{}' to ({}, {})", place, point.y(), point.x());
                    return Resolution::Found(point);
                }
                Ok(None) => {
                    debug!("No match for '{}'", place);
                    return Resolution::NoMatch;
                }
                Err(e) => {
                    self.diagnostics.attempt_failed(&AttemptFailure {
                        place: place.to_string(),
                        attempt,
                        error: e.to_string(),
                    });
                    if attempt >= max_attempts {
                        return Resolution::Exhausted { attempts: attempt };
                    }
                    if !self.policy.delay.is_zero() {
                        thread::sleep(self.policy.delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Scripted geocoder: answers from a table and can fail the first N calls.
    #[derive(Default)]
    pub struct StubGeocoder {
        places: HashMap<String, Coordinate>,
        failures_left: Cell<u32>,
        calls: RefCell<Vec<String>>,
    }

    impl StubGeocoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_place(mut self, place: &str, latitude: f64, longitude: f64) -> Self {
            self.places.insert(place.to_string(), coordinate(latitude, longitude));
            self
        }

        pub fn failing_first(self, failures: u32) -> Self {
            self.failures_left.set(failures);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Geocoder for StubGeocoder {
        fn lookup(&self, place: &str) -> Result<Option<Coordinate>, GeocodeError> {
            self.calls.borrow_mut().push(place.to_string());
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(GeocodeError::Status { status: 503 });
            }
            Ok(self.places.get(place).copied())
        }
    }

    #[derive(Default)]
    pub struct RecordingDiagnostics {
        pub failures: RefCell<Vec<AttemptFailure>>,
    }

    impl Diagnostics for RecordingDiagnostics {
        fn attempt_failed(&self, failure: &AttemptFailure) {
            self.failures.borrow_mut().push(failure.clone());
        }
    }

    pub fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}
