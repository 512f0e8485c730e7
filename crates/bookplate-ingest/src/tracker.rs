//! Run tracker
//!
//! Collects counts and timings per pipeline stage and writes them once, at
//! the end of the run, as a JSON report:
//!
//! ```json
//! {
//!   "elapsed_total_time": 12.5,
//!   "step_01": { "count_targz_files": 3, "elapsed_time": 0.01 },
//!   "step_02": { "count_all_marc_records": 900, "...": "..." }
//! }
//! ```
//!
//! The run's start instant lives only in memory and never reaches the report.

use bookplate_common::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

pub const STEP_DISCOVERY: &str = "step_01";
pub const STEP_EXTRACTION: &str = "step_02";
pub const STEP_CONFIRMATION: &str = "step_03";
pub const STEP_STORE: &str = "step_04";

/// Per-run accumulator of stage metrics
#[derive(Debug)]
pub struct Tracker {
    start: Instant,
    stages: BTreeMap<String, Map<String, Value>>,
}

/// Finalized, persistable tracker contents
#[derive(Debug, Clone, Serialize)]
pub struct TrackerReport {
    #[serde(flatten)]
    pub stages: BTreeMap<String, Map<String, Value>>,
    pub elapsed_total_time: f64,
}

impl Tracker {
    /// Start tracking a run now
    pub fn start() -> Self {
        Self::with_start(Instant::now())
    }

    /// Start tracking from a fixed instant
    pub fn with_start(start: Instant) -> Self {
        Self {
            start,
            stages: BTreeMap::new(),
        }
    }

    /// Set `field` of `stage`, creating the stage on first use
    pub fn record(&mut self, stage: &str, field: &str, value: impl Serialize) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(stage, field, error = %e, "Tracker value not serializable; storing null");
                Value::Null
            },
        };
        self.stages
            .entry(stage.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Read back a recorded value
    pub fn get(&self, stage: &str, field: &str) -> Option<&Value> {
        self.stages.get(stage)?.get(field)
    }

    /// Snapshot the stages with the total elapsed time since start
    ///
    /// Each call measures again, so totals from repeated calls never decrease.
    pub fn finalize(&self) -> TrackerReport {
        TrackerReport {
            stages: self.stages.clone(),
            elapsed_total_time: self.start.elapsed().as_secs_f64(),
        }
    }
}

impl TrackerReport {
    /// Write the report as indented JSON, replacing any previous report
    pub fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(
            path = %path.display(),
            elapsed_total_time = self.elapsed_total_time,
            "Tracker written"
        );
        Ok(())
    }
}

/// Measures one stage's `elapsed_time`
#[derive(Debug)]
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// Record the elapsed seconds as `elapsed_time` of this stage
    pub fn finish(self, tracker: &mut Tracker) {
        tracker.record(self.stage, "elapsed_time", self.start.elapsed().as_secs_f64());
    }
}
