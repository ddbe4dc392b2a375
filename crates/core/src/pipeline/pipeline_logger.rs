use std::collections::BTreeMap;
use std::time::Instant;

use crate::detection::domain::model_pool::PoolReport;

/// Cross-cutting observer for the tracking worker.
///
/// Lets callers watch per-cycle timings and counts without the cycle
/// knowing where they go (log output, GUI, nowhere).
pub trait PipelineLogger: Send {
    /// Called after every processed frame.
    fn cycle_completed(&mut self, frame_index: usize, frames_processed: u64);

    /// Time spent in one stage of one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Current value of a gauge such as active slots or dropped frames.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once when the worker stops. Default: no-op.
    fn summary(&self) {}
}

pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn cycle_completed(&mut self, _frame_index: usize, _frames_processed: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running cost of one cycle stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub cycles: u64,
    pub total_ms: f64,
    pub worst_ms: f64,
}

impl StageStats {
    fn record(&mut self, ms: f64) {
        self.cycles += 1;
        self.total_ms += ms;
        self.worst_ms = self.worst_ms.max(ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.total_ms / self.cycles as f64
        }
    }
}

/// Running view of a sampled gauge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaugeStats {
    pub samples: u64,
    pub sum: f64,
    pub peak: f64,
    pub last: f64,
}

impl GaugeStats {
    fn new(value: f64) -> Self {
        Self {
            samples: 1,
            sum: value,
            peak: value,
            last: value,
        }
    }

    fn record(&mut self, value: f64) {
        self.samples += 1;
        self.sum += value;
        self.peak = self.peak.max(value);
        self.last = value;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.samples as f64
    }
}

/// Keeps running per-stage and per-gauge statistics for a tracking run
/// and writes a tracking report through `log` when the worker stops.
///
/// A progress line goes out every `progress_every` processed frames.
pub struct TrackingStatsLogger {
    progress_every: u64,
    stages: BTreeMap<String, StageStats>,
    gauges: BTreeMap<String, GaugeStats>,
    started: Instant,
    frames_processed: u64,
    last_frame: Option<usize>,
    messages: Vec<String>,
}

impl TrackingStatsLogger {
    pub fn new(progress_every: u64) -> Self {
        Self {
            progress_every: progress_every.max(1),
            stages: BTreeMap::new(),
            gauges: BTreeMap::new(),
            started: Instant::now(),
            frames_processed: 0,
            last_frame: None,
            messages: Vec::new(),
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.get(name)
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeStats> {
        self.gauges.get(name)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The end-of-run report, or `None` before any cycle reported.
    pub fn report(&self) -> Option<String> {
        if self.stages.is_empty() && self.gauges.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut lines = vec![match self.last_frame {
            Some(index) => format!(
                "Tracked {} frames in {elapsed_s:.1}s, last frame #{index}",
                self.frames_processed
            ),
            None => format!("Tracked {} frames in {elapsed_s:.1}s", self.frames_processed),
        }];

        let cycle_ms: f64 = self.stages.values().map(|s| s.total_ms).sum();
        for (name, stats) in &self.stages {
            let share = if cycle_ms > 0.0 {
                stats.total_ms / cycle_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {name:<10} mean {:6.2}ms  worst {:6.2}ms  {share:3.0}% of cycle",
                stats.mean_ms(),
                stats.worst_ms
            ));
        }
        for (name, stats) in &self.gauges {
            lines.push(format!(
                "  {name:<14} mean {:5.1}  peak {:4.0}  last {:4.0}",
                stats.mean(),
                stats.peak,
                stats.last
            ));
        }
        if self.frames_processed > 0 && elapsed_s > 0.0 {
            lines.push(format!(
                "  sustained {:.1} frames/s",
                self.frames_processed as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for TrackingStatsLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for TrackingStatsLogger {
    fn cycle_completed(&mut self, frame_index: usize, frames_processed: u64) {
        self.frames_processed = frames_processed;
        self.last_frame = Some(frame_index);
        if frames_processed % self.progress_every == 0 {
            let faces = self.gauges.get("tracked_faces").map_or(0.0, |g| g.last);
            log::info!("Frame #{frame_index}: {frames_processed} processed, {faces} face(s) tracked");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.gauges.get_mut(name) {
            Some(stats) => stats.record(value),
            None => {
                self.gauges.insert(name.to_string(), GaugeStats::new(value));
            }
        }
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.report() {
            log::info!("\n{text}");
        }
    }
}

/// Forwards one cycle's pool report and identity timing to `logger`.
pub fn report_cycle(
    logger: &mut dyn PipelineLogger,
    report: &PoolReport,
    identity_ms: f64,
    tracked_faces: usize,
) {
    logger.timing("propose", report.proposal_ms);
    logger.timing("landmarks", report.landmark_ms);
    logger.timing("identity", identity_ms);
    logger.metric("active_slots", report.active_slots as f64);
    if report.proposed {
        logger.metric("candidates", report.candidates as f64);
    }
    logger.metric("tracked_faces", tracked_faces as f64);
}
