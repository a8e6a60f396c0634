use super::GpsSample;
use crate::config::GpsConfig;

/// Decides whether a fix moved far enough from the last *reported* fix to be
/// worth sending upstream. This cursor is separate from the feed's latest
/// sample.
#[derive(Debug, Clone)]
pub struct ReportThrottle {
    min_degrees_delta: f64,
    min_accuracy_delta_m: f64,
    last_reported: Option<GpsSample>,
}

impl ReportThrottle {
    pub fn new(config: &GpsConfig) -> Self {
        Self {
            min_degrees_delta: config.min_degrees_delta,
            min_accuracy_delta_m: config.min_accuracy_delta_m,
            last_reported: None,
        }
    }

    pub fn should_report(&self, sample: &GpsSample) -> bool {
        match &self.last_reported {
            None => true,
            Some(last) => {
                (sample.latitude - last.latitude).abs() >= self.min_degrees_delta
                    || (sample.longitude - last.longitude).abs() >= self.min_degrees_delta
                    || (sample.accuracy_m - last.accuracy_m).abs() >= self.min_accuracy_delta_m
            }
        }
    }

    /// Check a fix and, if significant, advance the reported cursor to it
    pub fn offer(&mut self, sample: &GpsSample) -> bool {
        if !self.should_report(sample) {
            return false;
        }
        self.last_reported = Some(sample.clone());
        true
    }

    pub fn last_reported(&self) -> Option<&GpsSample> {
        self.last_reported.as_ref()
    }
}
