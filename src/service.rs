//! Request handlers for the incubator's RPC services.
//!
//! A handler declares where it listens ([`RequestHandler::setup`]) and turns
//! a method name plus JSON arguments into a JSON reply. Queueing, framing
//! and correlating replies with requests belong to whatever transport
//! drives the handler.

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

/// Routing key and queue a handler consumes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub routing_key: String,
    pub queue_name: String,
}

pub trait RequestHandler {
    fn setup(&mut self) -> ServiceBinding;

    /// Reply to `method` called with `args`. Failures are reported in the
    /// reply as `{"error": ...}`, never by panicking.
    fn handle(&self, method: &str, args: &JsonValue) -> JsonValue;
}

pub const AVERAGE_SERVICE_KEY: &str = "dtcourse.incubator.averageservice";

#[derive(Debug, Deserialize)]
struct ComputeAverage {
    values: Vec<f64>,
}

/// Computes the mean of a list of numbers.
#[derive(Debug, Default)]
pub struct AverageService {
    bound: bool,
}

impl AverageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    fn compute_average(&self, values: &[f64]) -> JsonValue {
        log::info!("compute_average called. Received values: {values:?}");

        if values.is_empty() {
            log::warn!("Received an empty list of values. Cannot compute average. Returning error");
            return error_reply("Received an empty list of values. Cannot compute average.");
        }

        let average = values.iter().sum::<f64>() / values.len() as f64;
        json!({ "average": average })
    }
}

impl RequestHandler for AverageService {
    fn setup(&mut self) -> ServiceBinding {
        // Same name for routing key and queue.
        let binding = ServiceBinding {
            routing_key: AVERAGE_SERVICE_KEY.to_string(),
            queue_name: AVERAGE_SERVICE_KEY.to_string(),
        };
        self.bound = true;
        log::info!("AverageService setup complete.");
        binding
    }

    fn handle(&self, method: &str, args: &JsonValue) -> JsonValue {
        match method {
            "compute_average" => match ComputeAverage::deserialize(args) {
                Ok(request) => self.compute_average(&request.values),
                Err(e) => error_reply(&format!("invalid arguments for compute_average: {e}")),
            },
            other => {
                log::warn!("AverageService has no method '{other}'");
                error_reply(&format!("unknown method '{other}'"))
            }
        }
    }
}

fn error_reply(message: &str) -> JsonValue {
    json!({ "error": message })
}
