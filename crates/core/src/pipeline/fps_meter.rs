use std::time::Duration;

use crate::shared::constants::FPS_SMOOTHING;

/// Exponentially smoothed processing rate.
///
/// `t = s * t + (1 - s) * t_cycle`, `fps = 1000 / t`. The first sample
/// seeds the average directly.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    smoothing: f64,
    average_ms: Option<f64>,
}

impl FpsMeter {
    pub fn new(smoothing: f64) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 1.0),
            average_ms: None,
        }
    }

    pub fn record(&mut self, cycle: Duration) {
        let ms = cycle.as_secs_f64() * 1000.0;
        self.average_ms = Some(match self.average_ms {
            Some(avg) => self.smoothing * avg + (1.0 - self.smoothing) * ms,
            None => ms,
        });
    }

    /// Smoothed cycle time, if any cycle was recorded.
    pub fn average_ms(&self) -> Option<f64> {
        self.average_ms
    }

    pub fn fps(&self) -> f64 {
        match self.average_ms {
            Some(avg) if avg > 0.0 => 1000.0 / avg,
            _ => 0.0,
        }
    }

    /// Rate truncated to whole frames per second.
    pub fn fps_int(&self) -> i32 {
        self.fps() as i32
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(FPS_SMOOTHING)
    }
}
