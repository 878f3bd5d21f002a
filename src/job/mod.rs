//! Job orchestration module
//!
//! Runs the pipeline end to end.
//!
//! # Overview
//!
//! A [`TransformJob`] executes **Read → Rename → Drop → Partition → Write**
//! in strict phases:
//!
//! 1. Read and decode every source record
//! 2. Apply the projection to every record
//! 3. Group records by partition key values
//! 4. Infer one schema per partition and encode every shard
//! 5. Write shards partition by partition, then the `_SUCCESS` marker
//!
//! Nothing is written until phases 1-4 have succeeded for the whole input,
//! so only a destination failure can leave partial output behind.

mod types;

pub use types::{PartitionReport, TransformResult};

use types::{PartitionPlan, ShardPlan};

use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::output::{encode_parquet, json_to_arrow};
use crate::partition::{PartitionGroups, Partitioner};
use crate::schema::infer_schema;
use crate::source::{ObjectStoreSource, RecordSource, SourceBatch};
use crate::storage::StorageLocation;
use crate::transform::Projection;
use crate::types::{SourcedRecord, WriteMode};
use bytes::Bytes;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// Marker object written after a complete run
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// A configured field-projection job
#[derive(Debug, Clone)]
pub struct TransformJob {
    config: JobConfig,
    run_id: String,
}

impl TransformJob {
    /// Create a job; the run id is taken from the current UTC time
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            run_id: Utc::now().format("%Y%m%dT%H%M%S%3f").to_string(),
        }
    }

    /// Use a fixed run id
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Validate the config, open both locations and run the pipeline
    pub async fn run(&self) -> Result<TransformResult> {
        self.config.validate()?;

        let location = StorageLocation::source(&self.config.source_location)?;
        let source =
            ObjectStoreSource::new(location).with_concurrency(self.config.source.read_concurrency);

        self.run_with(&source, || {
            StorageLocation::destination(&self.config.destination_location)
        })
        .await
    }

    /// Run the pipeline against an explicit source
    ///
    /// The destination is opened only after every record has been planned.
    pub async fn run_with<F>(
        &self,
        source: &dyn RecordSource,
        open_destination: F,
    ) -> Result<TransformResult>
    where
        F: FnOnce() -> Result<StorageLocation>,
    {
        let start = Instant::now();
        info!(
            job = %self.config.job_name,
            run_id = %self.run_id,
            source = %source.location(),
            destination = %self.config.destination_location,
            "Starting job"
        );

        let batch = source.read_all().await?;
        let objects_read = batch.objects_read;
        let records_read = batch.records.len();

        let plans = self.plan(batch)?;

        let destination = open_destination()?;
        let mut result = TransformResult {
            job_name: self.config.job_name.clone(),
            run_id: self.run_id.clone(),
            source_location: source.location().to_string(),
            destination_location: destination.url().to_string(),
            objects_read,
            records_read,
            records_written: 0,
            files_written: 0,
            bytes_written: 0,
            objects_replaced: 0,
            partitions: Vec::with_capacity(plans.len()),
            duration_ms: 0,
        };

        self.write(plans, &destination, &mut result).await?;

        result.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            job = %result.job_name,
            records = result.records_written,
            partitions = result.partitions.len(),
            files = result.files_written,
            duration_ms = result.duration_ms,
            "Job finished"
        );
        Ok(result)
    }

    /// Transform, partition and encode every record without touching the
    /// destination
    pub(crate) fn plan(&self, batch: SourceBatch) -> Result<Vec<PartitionPlan>> {
        let projection = Projection::rename_then_drop(
            self.config.rename_rules.clone(),
            self.config.drop_field_names.iter().cloned(),
        );
        debug!(transforms = ?projection.names(), "Projection built");

        let records: Vec<SourcedRecord> = batch
            .records
            .into_iter()
            .map(|mut sourced| {
                sourced.record = projection.apply(sourced.record);
                sourced
            })
            .collect();

        let partitioner = Partitioner::new(self.config.partition_keys.iter().cloned())
            .with_retained_columns(self.config.output.retain_partition_columns);
        let groups = partitioner.split(records)?;
        info!(
            partitions = groups.len(),
            records = groups.record_count(),
            "Partitions planned"
        );

        self.encode(groups)
    }

    fn encode(&self, groups: PartitionGroups) -> Result<Vec<PartitionPlan>> {
        let writer_config = self.config.writer_config();
        let tag = self.config.output.compression.file_tag();
        let max = self.config.output.max_records_per_file;

        let mut plans = Vec::with_capacity(groups.len());
        for (path, records) in groups {
            let path = path.to_path_string();
            let schema = infer_schema(&path, records.iter().map(|r| &r.record))?;
            if schema.is_empty() && !records.is_empty() {
                return Err(Error::output(format!(
                    "Partition '{path}' has {} records but no data columns",
                    records.len()
                )));
            }

            let chunk_size = if max == 0 { records.len().max(1) } else { max };
            let mut shards = Vec::new();
            for (index, chunk) in records.chunks(chunk_size).enumerate() {
                let batch = json_to_arrow(chunk.iter().map(|r| &r.record), &schema)?;
                let data = encode_parquet(&batch, &writer_config)?;

                let name = format!("part-{index:05}-{}.{tag}.parquet", self.run_id);
                let key = if path.is_empty() {
                    name
                } else {
                    format!("{path}/{name}")
                };
                shards.push(ShardPlan {
                    key,
                    records: chunk.len(),
                    data,
                });
            }

            debug!(
                partition = %path,
                records = records.len(),
                columns = schema.len(),
                shards = shards.len(),
                "Partition encoded"
            );
            plans.push(PartitionPlan {
                path,
                columns: schema.len(),
                shards,
            });
        }

        Ok(plans)
    }

    async fn write(
        &self,
        plans: Vec<PartitionPlan>,
        destination: &StorageLocation,
        result: &mut TransformResult,
    ) -> Result<()> {
        for plan in plans {
            if self.config.output.write_mode == WriteMode::Overwrite {
                result.objects_replaced += destination.delete_prefix(&plan.path).await?;
            }

            let records = plan.records();
            let mut files = Vec::with_capacity(plan.shards.len());
            for shard in plan.shards {
                let size = shard.data.len();
                let path = destination.put(&shard.key, shard.data).await?;
                info!(
                    file = %destination.display(&path),
                    records = shard.records,
                    bytes = size,
                    "Shard written"
                );
                result.bytes_written += size;
                files.push(shard.key);
            }

            result.records_written += records;
            result.files_written += files.len();
            result.partitions.push(PartitionReport {
                path: plan.path,
                records,
                columns: plan.columns,
                files,
            });
        }

        if self.config.output.write_success_marker {
            destination.put(SUCCESS_MARKER, Bytes::new()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
