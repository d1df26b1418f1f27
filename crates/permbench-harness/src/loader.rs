//! Batch loading of a corpus into both engines.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use permbench_storage::{AclStore, MemoryAclStore, MemoryTupleStore, TupleStore};

use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::Corpus;

/// What one loader wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub batches: usize,
    pub items: usize,
    pub elapsed_ms: u64,
}

/// Both stores, loaded from the same corpus.
#[derive(Debug, Clone)]
pub struct LoadedStores {
    pub tuples: Arc<MemoryTupleStore>,
    pub acl: Arc<MemoryAclStore>,
    pub tuple_stats: LoadStats,
    pub acl_stats: LoadStats,
}

/// Writes the corpus tuples into `store` and checks the resulting count.
#[instrument(skip_all, fields(batch_size = corpus.settings.batch_size))]
pub async fn load_tuple_store<S: TupleStore>(corpus: &Corpus, store: &S) -> HarnessResult<LoadStats> {
    let start = Instant::now();
    let mut stats = LoadStats::default();
    let mut expected = 0;
    for batch in corpus.tuple_batches() {
        expected += batch.len();
        stats.items += store.write_batch(batch).await?;
        stats.batches += 1;
    }

    let stored = store.tuple_count().await?;
    if stored != expected {
        return Err(HarnessError::LoadVerification {
            message: format!("tuple store holds {stored} tuples, corpus has {expected}"),
        });
    }
    stats.elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        tuples = stored,
        batches = stats.batches,
        elapsed_ms = stats.elapsed_ms,
        "tuple store loaded"
    );
    Ok(stats)
}

/// Loads the corpus graph and its pre-flattened rows into `store`.
#[instrument(skip_all, fields(batch_size = corpus.settings.batch_size))]
pub async fn load_flat_acl(corpus: &Corpus, store: &MemoryAclStore) -> HarnessResult<LoadStats> {
    let start = Instant::now();
    let mut stats = LoadStats::default();
    store.load_graph(corpus.graph.clone()).await;

    let mut expected = 0;
    for batch in corpus.row_batches() {
        expected += batch.len();
        stats.items += store.insert_rows(batch).await?;
        stats.batches += 1;
    }

    let stored = store.row_count().await?;
    if stored != expected {
        return Err(HarnessError::LoadVerification {
            message: format!("flat ACL holds {stored} rows, corpus derives {expected}"),
        });
    }
    stats.elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        rows = stored,
        batches = stats.batches,
        elapsed_ms = stats.elapsed_ms,
        "flat ACL loaded"
    );
    Ok(stats)
}

/// Loads fresh stores for both engines concurrently.
pub async fn load_all(corpus: Arc<Corpus>) -> HarnessResult<LoadedStores> {
    let tuples = MemoryTupleStore::new_shared();
    let acl = MemoryAclStore::new_shared(corpus.settings.max_depth);

    let (tuple_stats, acl_stats) = tokio::try_join!(
        load_tuple_store(&corpus, tuples.as_ref()),
        load_flat_acl(&corpus, acl.as_ref()),
    )?;

    Ok(LoadedStores {
        tuples,
        acl,
        tuple_stats,
        acl_stats,
    })
}
