use std::marker::PhantomData;

use energy_client::domain::{CapacityRecord, ConsumptionRecord};
use futures::StreamExt;
use time::PrimitiveDateTime;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Canonical ordering of a loaded table.
pub trait SortKey {
    type Key: Ord;

    fn sort_key(&self) -> Self::Key;
}

impl SortKey for ConsumptionRecord {
    type Key = PrimitiveDateTime;

    fn sort_key(&self) -> Self::Key {
        self.ts
    }
}

impl SortKey for CapacityRecord {
    type Key = i32;

    fn sort_key(&self) -> Self::Key {
        self.year
    }
}

/// Collects a pipeline into an in-memory table sorted by [`SortKey`].
///
/// Rows rejected by a cleaning step are dropped and counted; any other
/// error aborts the load so a partial table is never returned.
pub struct TableSink<T> {
    table: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TableSink<T> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<T> Sink<T> for TableSink<T>
where
    T: SortKey + Send + 'static,
{
    type Output = Vec<T>;

    async fn run<S>(&self, mut input: S) -> Result<Vec<T>, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut rows: Vec<T> = Vec::new();
        let mut dropped: u64 = 0;

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => rows.push(env.payload),
                Err(PipelineError::Transform(reason)) => {
                    dropped += 1;
                    tracing::debug!(table = self.table, %reason, "dropping row");
                }
                Err(e) => {
                    tracing::error!(table = self.table, error = %e, "table load failed");
                    return Err(e);
                }
            }
        }

        // Stable: rows sharing a key keep their file order.
        rows.sort_by_key(|r| r.sort_key());

        metrics::counter!("dashboard_rows_loaded_total", "table" => self.table).increment(rows.len() as u64);
        metrics::counter!("dashboard_rows_dropped_total", "table" => self.table).increment(dropped);
        tracing::info!(table = self.table, rows = rows.len(), dropped, "table loaded");

        Ok(rows)
    }
}
