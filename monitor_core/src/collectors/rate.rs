use std::collections::HashMap;
use std::time::Instant;

/// Turns cumulative counters into per-second rates.
///
/// The first observation of a key yields 0. A counter that goes backwards
/// (interface reset, wrap) also yields 0 for that interval.
#[derive(Debug, Default)]
pub struct RateTracker {
    previous: HashMap<String, (f64, Instant)>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, key: &str, value: f64, at: Instant) -> f64 {
        let rate = match self.previous.get(key) {
            Some((previous, previous_at)) => {
                let elapsed = at.saturating_duration_since(*previous_at).as_secs_f64();
                let delta = value - previous;
                if elapsed > 0.0 && delta >= 0.0 {
                    delta / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        self.previous.insert(key.to_string(), (value, at));
        rate
    }
}
