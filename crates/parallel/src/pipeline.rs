//! Pipeline entry point: partition, smooth in parallel, join, merge, write
//!
//! All tunables arrive in one [`PipelineConfig`]; nothing is read from
//! process-wide state.

use crate::partition::partition;
use crate::strategy::{CancelToken, ProcessingMode, WorkerPool};
use ivmsmooth_algorithms::merge::{merge, MergeParams, MergeReport};
use ivmsmooth_algorithms::smoothing::{smooth_features, SmoothingParams};
use ivmsmooth_algorithms::vector::{dissolve_by, AreaMethod, BooleanErase, Erase};
use ivmsmooth_core::io::FeatureSink;
use ivmsmooth_core::{
    Diagnostic, DiagnosticKind, Error, FeatureCollection, Result, CRS,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::{Duration, Instant, SystemTime};
use tracing::{info, warn};

/// Everything a run needs besides the data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: ProcessingMode,
    pub smoothing: SmoothingParams,
    pub merge: MergeParams,
    /// Threaded through to the sink unchanged
    pub crs: CRS,
    /// Dissolve features sharing this attribute before partitioning
    pub dissolve_field: Option<String>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.smoothing.validate()?;
        self.merge.validate()?;
        if let ProcessingMode::ParallelWith(0) = self.mode {
            return Err(Error::InvalidParameter {
                name: "workers",
                value: "0".into(),
                reason: "at least one worker is required".into(),
            });
        }
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.mode.worker_count()
    }
}

/// Counts and timings for one run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub input_features: usize,
    /// Features entering partitioning (after the optional attribute dissolve)
    pub prepared_features: usize,
    pub workers: usize,
    pub partitions: Vec<Range<usize>>,
    /// Outer rings that could not be smoothed
    pub polygons_dropped: usize,
    pub holes_dropped: usize,
    pub failed_partitions: usize,
    pub smoothed_features: usize,
    pub merge: MergeReport,
    pub diagnostics: Vec<Diagnostic>,
    pub smoothing_started: SystemTime,
    pub smoothing_finished: SystemTime,
    pub smoothing_elapsed: Duration,
    pub total_elapsed: Duration,
}

impl PipelineReport {
    pub fn output_features(&self) -> usize {
        self.merge.output_features
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        ivmsmooth_core::diagnostics::count_kind(&self.diagnostics, kind)
    }
}

/// Result of [`Pipeline::run`]
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: FeatureCollection,
    pub report: PipelineReport,
}

/// The partitioned smoothing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    eraser: Box<dyn Erase>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Pipeline with polygon-difference erase
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            eraser: Box::new(BooleanErase),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_eraser(mut self, eraser: impl Erase + 'static) -> Self {
        self.eraser = Box::new(eraser);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this pipeline's runs
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Smooth `features` and merge the results, subtracting `exclusion`.
    pub fn run(
        &self,
        features: FeatureCollection,
        exclusion: &FeatureCollection,
    ) -> Result<PipelineOutput> {
        let started = Instant::now();
        self.config.validate()?;
        if self.config.crs.is_geographic() && self.config.merge.area_method == AreaMethod::Planar {
            warn!(crs = %self.config.crs, "planar areas on lon/lat coordinates");
        }

        let input_features = features.len();
        let features = match &self.config.dissolve_field {
            Some(field) => dissolve_by(&features, field),
            None => features,
        };

        let workers = self.config.worker_count();
        let partitions = partition(&features, workers)?;
        let ranges: Vec<Range<usize>> = partitions.iter().map(|p| p.range.clone()).collect();
        info!(
            features = features.len(),
            workers,
            first = ranges.first().map(|r| r.len()).unwrap_or(0),
            "partitioned"
        );

        let smoothing_started = SystemTime::now();
        let smoothing_clock = Instant::now();
        let params = &self.config.smoothing;
        let pool = WorkerPool::new(self.config.mode).with_cancel_token(self.cancel.clone());
        let runs = pool.run(partitions, |p, token| {
            smooth_features(&p.features.features, params, || token.is_cancelled())
        })?;
        let smoothing_elapsed = smoothing_clock.elapsed();
        let smoothing_finished = SystemTime::now();

        let mut diagnostics = Vec::new();
        let mut results = Vec::with_capacity(runs.len());
        let (mut polygons_dropped, mut holes_dropped, mut failed_partitions) = (0, 0, 0);
        for run in runs {
            match run.outcome {
                Ok(smoothed) => {
                    polygons_dropped += smoothed.polygons_dropped;
                    holes_dropped += smoothed.holes_dropped;
                    diagnostics.extend(
                        smoothed
                            .diagnostics
                            .into_iter()
                            .map(|d| d.with_partition(run.index)),
                    );
                    results.push(smoothed.features);
                }
                Err(e) => {
                    failed_partitions += 1;
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::PartitionFailure, e.to_string())
                            .with_partition(run.index),
                    );
                    results.push(FeatureCollection::new());
                }
            }
        }
        let smoothed_features: usize = results.iter().map(|r| r.len()).sum();
        info!(
            smoothed = smoothed_features,
            dropped = polygons_dropped,
            holes_dropped,
            failed_partitions,
            elapsed_ms = smoothing_elapsed.as_millis() as u64,
            "smoothing complete"
        );

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let merged = merge(results, exclusion, self.eraser.as_ref(), &self.config.merge)?;
        diagnostics.extend(merged.diagnostics);
        if !diagnostics.is_empty() {
            warn!(count = diagnostics.len(), "run recorded diagnostics");
        }

        let report = PipelineReport {
            input_features,
            prepared_features: features.len(),
            workers,
            partitions: ranges,
            polygons_dropped,
            holes_dropped,
            failed_partitions,
            smoothed_features,
            merge: merged.report,
            diagnostics,
            smoothing_started,
            smoothing_finished,
            smoothing_elapsed,
            total_elapsed: started.elapsed(),
        };

        Ok(PipelineOutput {
            features: merged.features,
            report,
        })
    }

    /// [`run`](Self::run), then hand the result to `sink`.
    ///
    /// A sink failure is fatal and tagged with the `output` stage.
    pub fn run_to_sink(
        &self,
        features: FeatureCollection,
        exclusion: &FeatureCollection,
        sink: &mut dyn FeatureSink,
    ) -> Result<PipelineReport> {
        let output = self.run(features, exclusion)?;
        sink.write(&output.features, &self.config.crs).map_err(|e| {
            Error::collaborator("output", Some(format!("sink {}", sink.name())), e)
        })?;
        Ok(output.report)
    }
}
