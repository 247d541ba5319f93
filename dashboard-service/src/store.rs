//! Loaded tables, memoized for the lifetime of the process.
//!
//! Each `(loader, path)` pair is loaded at most once: the first caller runs
//! the pipeline while concurrent callers wait on the same cell, and every
//! later call gets the same shared table. A failed load leaves the cell
//! empty so the next caller retries. There is no invalidation; restart the
//! process to pick up changed files.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use energy_client::domain::{CapacityRecord, ConsumptionRecord, RawConsumption};
use once_cell::sync::Lazy;
use tokio::sync::OnceCell;

use crate::{
    config::DataConfig,
    pipeline::{Pipeline, PipelineError},
    sinks::TableSink,
    sources::{CapacityCsvFileSource, ConsumptionCsvFileSource},
    transform::{ConsumptionCleaning, Passthrough},
};

type Table<T> = Arc<[T]>;
type Cells<T> = Mutex<HashMap<PathBuf, Arc<OnceCell<Table<T>>>>>;

/// Runs the consumption loader and cleaner over one file.
pub async fn load_consumption(path: PathBuf) -> Result<Vec<ConsumptionRecord>, PipelineError> {
    let pipeline: Pipeline<_, RawConsumption, ConsumptionRecord, _> = Pipeline {
        source: ConsumptionCsvFileSource::new(path),
        clean: Arc::new(ConsumptionCleaning),
        sink: TableSink::new("consumption"),
    };
    pipeline.run().await
}

/// Runs the capacity loader over one file.
pub async fn load_capacity(path: PathBuf) -> Result<Vec<CapacityRecord>, PipelineError> {
    let pipeline: Pipeline<_, CapacityRecord, CapacityRecord, _> = Pipeline {
        source: CapacityCsvFileSource::new(path),
        clean: Arc::new(Passthrough::default()),
        sink: TableSink::new("capacity"),
    };
    pipeline.run().await
}

#[derive(Default)]
pub struct TableCache {
    consumption: Cells<ConsumptionRecord>,
    capacity: Cells<CapacityRecord>,
}

static GLOBAL_CACHE: Lazy<TableCache> = Lazy::new(TableCache::default);

impl TableCache {
    pub fn global() -> &'static TableCache {
        &GLOBAL_CACHE
    }

    pub async fn consumption(&self, path: &Path) -> Result<Table<ConsumptionRecord>, PipelineError> {
        let cell = cell_for(&self.consumption, path);
        cell.get_or_try_init(|| async {
            let rows = load_consumption(path.to_path_buf()).await?;
            Ok::<_, PipelineError>(Table::from(rows))
        })
        .await
        .cloned()
    }

    pub async fn capacity(&self, path: &Path) -> Result<Table<CapacityRecord>, PipelineError> {
        let cell = cell_for(&self.capacity, path);
        cell.get_or_try_init(|| async {
            let rows = load_capacity(path.to_path_buf()).await?;
            Ok::<_, PipelineError>(Table::from(rows))
        })
        .await
        .cloned()
    }
}

fn cell_for<T>(cells: &Cells<T>, path: &Path) -> Arc<OnceCell<Table<T>>> {
    // The lock only guards the map lookup; loading happens outside it.
    let mut map = cells.lock().unwrap_or_else(PoisonError::into_inner);
    map.entry(path.to_path_buf()).or_default().clone()
}

/// The two cleaned tables, shared read-only by every section.
#[derive(Debug, Clone)]
pub struct DataStore {
    pub consumption: Table<ConsumptionRecord>,
    pub capacity: Table<CapacityRecord>,
}

impl DataStore {
    pub async fn load(cache: &TableCache, cfg: &DataConfig) -> Result<Self, PipelineError> {
        let (consumption, capacity) = tokio::try_join!(
            cache.consumption(&cfg.consumption_path),
            cache.capacity(&cfg.capacity_path)
        )?;
        Ok(Self {
            consumption,
            capacity,
        })
    }

    pub fn from_tables(consumption: Vec<ConsumptionRecord>, capacity: Vec<CapacityRecord>) -> Self {
        Self {
            consumption: consumption.into(),
            capacity: capacity.into(),
        }
    }
}
