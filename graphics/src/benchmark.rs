//! GPU timing collection and plain-text reports.
//!
//! Timestamp pairs are read back after each frame's fence retires and
//! accumulated until the configured sample count is reached; reports
//! average over whatever was collected.

use crate::backend::Backend;
use crate::command::TimestampQuery;

/// Default number of samples a report averages over.
pub const DEFAULT_SAMPLE_TARGET: usize = 1000;

/// Accumulates GPU frame and per-object timings.
#[derive(Debug)]
pub struct GpuBenchmark {
    sample_target: usize,
    frequency: u64,
    frame_samples: Vec<f64>,
    object_samples: Vec<Vec<f64>>,
}

impl GpuBenchmark {
    pub fn new(sample_target: usize) -> Self {
        Self {
            sample_target,
            frequency: 0,
            frame_samples: Vec::new(),
            object_samples: Vec::new(),
        }
    }

    fn ticks_to_ms(&self, begin: u64, end: u64) -> f64 {
        if self.frequency == 0 {
            return 0.0;
        }
        end.saturating_sub(begin) as f64 * 1000.0 / self.frequency as f64
    }

    /// Read back the latest retired frame's timings.
    ///
    /// Only call after the frame's fence value has retired; earlier the
    /// query pairs may still belong to the previous frame.
    pub fn collect(&mut self, backend: &dyn Backend, object_count: usize) {
        if self.frequency == 0 {
            self.frequency = backend.timestamp_frequency();
        }
        if self.frame_samples.len() < self.sample_target {
            if let Some((begin, end)) = backend.timestamp_pair(TimestampQuery::FRAME) {
                let ms = self.ticks_to_ms(begin, end);
                self.frame_samples.push(ms);
            }
        }
        if self.object_samples.len() < object_count {
            self.object_samples.resize_with(object_count, Vec::new);
        }
        for index in 0..object_count {
            if self.object_samples[index].len() >= self.sample_target {
                continue;
            }
            if let Some((begin, end)) =
                backend.timestamp_pair(TimestampQuery::object(index as u32))
            {
                let ms = self.ticks_to_ms(begin, end);
                self.object_samples[index].push(ms);
            }
        }
    }

    /// True once every tracked series holds the full sample count.
    pub fn is_complete(&self) -> bool {
        self.frame_samples.len() >= self.sample_target
            && self
                .object_samples
                .iter()
                .all(|s| s.len() >= self.sample_target)
    }

    pub fn frame_sample_count(&self) -> usize {
        self.frame_samples.len()
    }

    fn average(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Whole-frame GPU time report.
    pub fn frame_report(&self) -> String {
        format!(
            "Average frame GPU time: {:.4} ms ({} samples)",
            Self::average(&self.frame_samples),
            self.frame_samples.len()
        )
    }

    /// Per-object GPU time report, one line per object.
    pub fn object_report(&self) -> String {
        let mut report = String::new();
        for (index, samples) in self.object_samples.iter().enumerate() {
            report.push_str(&format!(
                "Object {index}: average GPU time {:.4} ms\n",
                Self::average(samples)
            ));
        }
        report.push_str(&format!(
            "Benchmark average was made with {} samples",
            self.frame_samples.len()
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::command::Command;

    #[test]
    fn collect_caps_at_the_sample_target() {
        let backend = HeadlessBackend::new();
        backend
            .submit(
                &[
                    Command::BeginTimestamp(TimestampQuery::FRAME),
                    Command::EndTimestamp(TimestampQuery::FRAME),
                ],
                1,
            )
            .unwrap();

        let mut benchmark = GpuBenchmark::new(3);
        for _ in 0..10 {
            benchmark.collect(&backend, 0);
        }
        assert_eq!(benchmark.frame_sample_count(), 3);
        assert!(benchmark.is_complete());
    }

    #[test]
    fn reports_mention_the_sample_count() {
        let backend = HeadlessBackend::new();
        backend
            .submit(
                &[
                    Command::BeginTimestamp(TimestampQuery::FRAME),
                    Command::BeginTimestamp(TimestampQuery::object(0)),
                    Command::EndTimestamp(TimestampQuery::object(0)),
                    Command::EndTimestamp(TimestampQuery::FRAME),
                ],
                1,
            )
            .unwrap();

        let mut benchmark = GpuBenchmark::new(10);
        benchmark.collect(&backend, 1);
        assert!(benchmark.frame_report().contains("1 samples"));
        assert!(benchmark.object_report().contains("Object 0"));
        assert!(benchmark
            .object_report()
            .contains("Benchmark average was made with 1 samples"));
    }

    #[test]
    fn missing_pairs_collect_nothing() {
        let backend = HeadlessBackend::new();
        let mut benchmark = GpuBenchmark::new(10);
        benchmark.collect(&backend, 2);
        assert_eq!(benchmark.frame_sample_count(), 0);
        assert!(!benchmark.is_complete());
    }
}
