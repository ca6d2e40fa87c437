//! # ivmsmooth Parallel
//!
//! Partitioned parallel execution of the smoothing pipeline.
//!
//! This crate provides:
//! - The partitioner: contiguous slices, remainder in the first one
//! - A worker pool with one worker per partition, failure isolation and cancellation
//! - `Pipeline`: partition, smooth, join, merge and write in one call

pub mod partition;
pub mod pipeline;
pub mod strategy;

pub use partition::{default_worker_count, partition, partition_sizes, Partition};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput, PipelineReport};
pub use strategy::{CancelToken, ParallelStrategy, PartitionRun, ProcessingMode, WorkerPool};
