//! Frame timing instrumentation.
//!
//! A fixed-size ring keeps the most recent frame samples; statistics are derived from
//! the filled part only. While recording, discrete events are logged with timestamps
//! and the whole lot can be exported as a JSON-serializable snapshot.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::entities::EntityCounts;

pub const FRAME_CAPACITY: usize = 120;

/// Frames slower than this count as jank (two frames at 60 Hz).
pub const JANK_THRESHOLD_MS: f64 = 1000.0 / 30.0;

/// Recording log is capped; older entries are kept, newer ones counted as dropped.
pub const MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub delta_ms: f64,
    pub update_ms: f64,
    pub draw_ms: f64,
}

/// Circular buffer of the last `N` frames.
#[derive(Debug, Clone)]
pub struct FrameRing<const N: usize> {
    samples: [FrameSample; N],
    write_index: usize,
    frame_count: u64,
    jank_total: u64,
}

impl<const N: usize> Default for FrameRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameRing<N> {
    pub fn new() -> Self {
        Self {
            samples: [FrameSample::default(); N],
            write_index: 0,
            frame_count: 0,
            jank_total: 0,
        }
    }

    pub fn push(&mut self, sample: FrameSample) {
        if N == 0 {
            return;
        }
        self.samples[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % N;
        self.frame_count += 1;
        if sample.delta_ms > JANK_THRESHOLD_MS {
            self.jank_total += 1;
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn jank_total(&self) -> u64 {
        self.jank_total
    }

    pub fn filled(&self) -> usize {
        self.frame_count.min(N as u64) as usize
    }

    /// Filled samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FrameSample> + '_ {
        let filled = self.filled();
        (0..filled).map(move |i| &self.samples[(self.write_index + N - filled + i) % N])
    }

    /// Frame deltas of the filled window, oldest first.
    pub fn sparkline(&self) -> Vec<f64> {
        self.iter().map(|s| s.delta_ms).collect()
    }

    pub fn stats(&self) -> FrameStats {
        let window = self.filled();
        let mut stats = FrameStats {
            frames: self.frame_count,
            window,
            jank_total: self.jank_total,
            ..FrameStats::default()
        };
        if window == 0 {
            return stats;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let (mut delta, mut update, mut draw) = (0.0, 0.0, 0.0);
        for s in self.iter() {
            delta += s.delta_ms;
            update += s.update_ms;
            draw += s.draw_ms;
            min = min.min(s.delta_ms);
            max = max.max(s.delta_ms);
            if s.delta_ms > JANK_THRESHOLD_MS {
                stats.jank_window += 1;
            }
        }
        let n = window as f64;
        stats.avg_delta_ms = delta / n;
        stats.min_delta_ms = min;
        stats.max_delta_ms = max;
        stats.avg_update_ms = update / n;
        stats.avg_draw_ms = draw / n;
        stats.fps = if stats.avg_delta_ms > 0.0 {
            1000.0 / stats.avg_delta_ms
        } else {
            0.0
        };
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub frames: u64,
    pub window: usize,
    pub avg_delta_ms: f64,
    pub min_delta_ms: f64,
    pub max_delta_ms: f64,
    pub avg_update_ms: f64,
    pub avg_draw_ms: f64,
    pub fps: f64,
    pub jank_total: u64,
    pub jank_window: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    StateChange,
    ScoreChange,
    DifficultyChange,
    Jank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub kind: LogKind,
    pub t_ms: f64,
    pub detail: String,
}

/// Host and engine facts attached to an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub user_agent: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub device_pixel_ratio: f64,
    pub fixed_step_ms: f64,
    pub frame_capacity: usize,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub exported_at_ms: f64,
    pub stats: FrameStats,
    pub entities: EntityCounts,
    pub system: SystemInfo,
    pub sparkline: Vec<f64>,
    pub log: Vec<LogEntry>,
    pub dropped_log_entries: u64,
}

impl DebugSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugMonitor {
    ring: FrameRing<FRAME_CAPACITY>,
    recording: bool,
    log: Vec<LogEntry>,
    dropped: u64,
}

impl DebugMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ring(&self) -> &FrameRing<FRAME_CAPACITY> {
        &self.ring
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn record_frame(&mut self, sample: FrameSample, now_ms: f64) {
        self.ring.push(sample);
        if self.recording && sample.delta_ms > JANK_THRESHOLD_MS {
            debug!("jank frame: {:.1} ms", sample.delta_ms);
            self.log(LogKind::Jank, now_ms, format!("{:.1}ms", sample.delta_ms));
        }
    }

    /// Starts a fresh session; the previous session's log is discarded.
    pub fn start_recording(&mut self) {
        self.recording = true;
        self.log.clear();
        self.dropped = 0;
    }

    /// Stops logging. The log stays exportable until the next `start_recording`.
    pub fn stop_recording(&mut self) {
        self.recording = false;
    }

    pub fn log(&mut self, kind: LogKind, t_ms: f64, detail: impl Into<String>) {
        if !self.recording {
            return;
        }
        if self.log.len() >= MAX_LOG_ENTRIES {
            self.dropped += 1;
            return;
        }
        self.log.push(LogEntry {
            kind,
            t_ms,
            detail: detail.into(),
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn export(&self, now_ms: f64, entities: EntityCounts, system: SystemInfo) -> DebugSnapshot {
        DebugSnapshot {
            exported_at_ms: now_ms,
            stats: self.ring.stats(),
            entities,
            system,
            sparkline: self.ring.sparkline(),
            log: self.log.clone(),
            dropped_log_entries: self.dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(delta_ms: f64) -> FrameSample {
        FrameSample {
            delta_ms,
            update_ms: delta_ms / 10.0,
            draw_ms: delta_ms / 5.0,
        }
    }

    #[test]
    fn empty_ring_has_zero_stats() {
        let ring: FrameRing<4> = FrameRing::new();
        let stats = ring.stats();
        assert_eq!(stats.window, 0);
        assert_eq!(stats.avg_delta_ms, 0.0);
        assert!(ring.sparkline().is_empty());
    }

    #[test]
    fn partial_window_averages_only_filled_slots() {
        let mut ring: FrameRing<8> = FrameRing::new();
        ring.push(sample(10.0));
        ring.push(sample(20.0));
        ring.push(sample(30.0));
        let stats = ring.stats();
        assert_eq!(stats.window, 3);
        assert!((stats.avg_delta_ms - 20.0).abs() < 1e-12);
        assert_eq!(stats.min_delta_ms, 10.0);
        assert_eq!(stats.max_delta_ms, 30.0);
        assert!((stats.avg_update_ms - 2.0).abs() < 1e-12);
    }

    #[test]
    fn wrapped_window_matches_last_samples() {
        let mut ring: FrameRing<5> = FrameRing::new();
        let deltas: Vec<f64> = (1..=13).map(|i| i as f64).collect();
        for &d in &deltas {
            ring.push(sample(d));
        }
        let last: Vec<f64> = deltas[deltas.len() - 5..].to_vec();
        assert_eq!(ring.sparkline(), last);
        let mean = last.iter().sum::<f64>() / 5.0;
        assert!((ring.stats().avg_delta_ms - mean).abs() < 1e-12);
        assert_eq!(ring.frame_count(), 13);
        assert_eq!(ring.filled(), 5);
    }

    #[test]
    fn jank_window_forgets_but_total_does_not() {
        let mut ring: FrameRing<4> = FrameRing::new();
        ring.push(sample(50.0));
        ring.push(sample(40.0));
        assert_eq!(ring.stats().jank_window, 2);
        assert_eq!(ring.jank_total(), 2);

        let mut last_total = ring.jank_total();
        for _ in 0..4 {
            ring.push(sample(16.0));
            assert!(ring.jank_total() >= last_total);
            last_total = ring.jank_total();
        }
        let stats = ring.stats();
        assert_eq!(stats.jank_window, 0);
        assert_eq!(stats.jank_total, 2);
    }

    #[test]
    fn threshold_frame_is_not_jank() {
        let mut ring: FrameRing<2> = FrameRing::new();
        ring.push(sample(JANK_THRESHOLD_MS));
        assert_eq!(ring.jank_total(), 0);
    }

    #[test]
    fn log_only_while_recording() {
        let mut monitor = DebugMonitor::new();
        monitor.log(LogKind::ScoreChange, 1.0, "1");
        assert!(monitor.entries().is_empty());

        monitor.start_recording();
        monitor.log(LogKind::ScoreChange, 2.0, "2");
        monitor.record_frame(sample(70.0), 3.0);
        monitor.record_frame(sample(16.0), 4.0);
        assert_eq!(monitor.entries().len(), 2);
        assert_eq!(monitor.entries()[1].kind, LogKind::Jank);
    }

    #[test]
    fn export_is_repeatable_until_next_session() {
        let mut monitor = DebugMonitor::new();
        monitor.start_recording();
        monitor.log(LogKind::StateChange, 5.0, "play");
        monitor.stop_recording();
        monitor.log(LogKind::StateChange, 6.0, "dead");

        let a = monitor.export(10.0, EntityCounts::default(), SystemInfo::default());
        let b = monitor.export(10.0, EntityCounts::default(), SystemInfo::default());
        assert_eq!(a, b);
        assert_eq!(a.log.len(), 1);

        monitor.start_recording();
        assert!(monitor.entries().is_empty());
    }

    #[test]
    fn log_is_capped() {
        let mut monitor = DebugMonitor::new();
        monitor.start_recording();
        for i in 0..MAX_LOG_ENTRIES + 3 {
            monitor.log(LogKind::ScoreChange, i as f64, "x");
        }
        assert_eq!(monitor.entries().len(), MAX_LOG_ENTRIES);
        let snap = monitor.export(0.0, EntityCounts::default(), SystemInfo::default());
        assert_eq!(snap.dropped_log_entries, 3);
    }

    #[test]
    fn snapshot_json_round_trip() {
        let mut monitor = DebugMonitor::new();
        monitor.start_recording();
        for i in 0..200 {
            monitor.record_frame(sample(16.0 + (i % 7) as f64 * 3.3), i as f64 * 16.7);
        }
        monitor.log(LogKind::DifficultyChange, 99.5, "hard");
        let snap = monitor.export(
            3340.2,
            EntityCounts {
                pipes: 3,
                trees: 7,
                ..EntityCounts::default()
            },
            SystemInfo {
                user_agent: "test".into(),
                fixed_step_ms: 1000.0 / 60.0,
                frame_capacity: FRAME_CAPACITY,
                ..SystemInfo::default()
            },
        );
        let text = snap.to_json().unwrap();
        assert_eq!(DebugSnapshot::from_json(&text).unwrap(), snap);
    }
}
