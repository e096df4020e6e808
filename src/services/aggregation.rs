//! Windowed aggregation of stored job outcomes into a ranked [`ResultMatrix`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{BuildRecord, MatrixColumn, ResultMatrix, StatusEncoding, TestStatus};
use crate::store::TrackerStore;

/// Statuses of one test keyed by `(build_id, job_slot)`. First seen wins.
type Observations = HashMap<(i64, usize), TestStatus>;

/// Read-only view over the store that builds dashboard matrices.
#[derive(Clone)]
pub struct Aggregator {
    store: TrackerStore,
}

impl Aggregator {
    pub fn new(store: TrackerStore) -> Self {
        Self { store }
    }

    /// Build the matrix for the `window_size` most recent builds.
    ///
    /// Returns [`AppError::EmptyCorpus`] when no build in the window can be loaded.
    pub async fn aggregate(&self, window_size: usize) -> AppResult<ResultMatrix> {
        let builds = self.load_window(window_size).await?;
        let observations = self.collect_observations(&builds).await?;
        Ok(rank(&builds, observations))
    }

    /// Newest `window_size` build records, newest first.
    async fn load_window(&self, window_size: usize) -> AppResult<Vec<BuildRecord>> {
        let mut ids = self.store.known_build_ids().await?;
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();
        ids.truncate(window_size);
        if ids.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let mut builds = Vec::with_capacity(ids.len());
        for build_id in ids {
            match self.store.get_build(build_id).await {
                Ok(Some(record)) => builds.push(record),
                Ok(None) => debug!(build_id, "Build record expired or missing, skipping"),
                Err(AppError::Serialization(e)) => {
                    debug!(build_id, "Undecodable build record, skipping: {}", e)
                }
                Err(e) => return Err(e),
            }
        }

        if builds.is_empty() {
            return Err(AppError::EmptyCorpus);
        }
        Ok(builds)
    }

    async fn collect_observations(
        &self,
        builds: &[BuildRecord],
    ) -> AppResult<BTreeMap<String, Observations>> {
        let mut by_test: BTreeMap<String, Observations> = BTreeMap::new();

        for build in builds {
            for (slot, &job_id) in build.job_ids.iter().enumerate() {
                let outcomes = match self.store.get_job_outcomes(job_id).await {
                    Ok(Some(outcomes)) => outcomes,
                    Ok(None) => continue,
                    Err(AppError::Serialization(e)) => {
                        debug!(job_id, "Undecodable job outcomes, skipping: {}", e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for outcome in outcomes {
                    let status = outcome.status();
                    by_test
                        .entry(outcome.0)
                        .or_default()
                        .entry((build.build_id, slot))
                        .or_insert(status);
                }
            }
        }

        Ok(by_test)
    }
}

/// Fill, score, sort and encode. Builds must be newest first.
fn rank(builds: &[BuildRecord], observations: BTreeMap<String, Observations>) -> ResultMatrix {
    let slots = builds.iter().map(|b| b.job_ids.len()).max().unwrap_or(0);
    let columns: Vec<MatrixColumn> = builds
        .iter()
        .flat_map(|b| (0..slots).map(move |slot| MatrixColumn(b.build_id, slot)))
        .collect();

    let mut rows: Vec<(String, f64, Vec<TestStatus>)> = observations
        .into_iter()
        .map(|(test, seen)| {
            let statuses: Vec<TestStatus> = columns
                .iter()
                .map(|c| {
                    seen.get(&(c.build_id(), c.job_slot()))
                        .copied()
                        .unwrap_or(TestStatus::Unknown)
                })
                .collect();
            let score = statuses.iter().map(|s| s.instability_weight()).sum();
            (test, score, statuses)
        })
        .collect();

    rows.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    let mut index = Vec::with_capacity(rows.len());
    let mut data = Vec::with_capacity(rows.len());
    for (test, _, statuses) in rows {
        index.push(test);
        data.push(statuses.iter().map(|s| s.code()).collect());
    }

    ResultMatrix {
        columns,
        index,
        data,
        metadata: builds.iter().map(|b| (b.build_id, b.clone())).collect(),
        encoding: StatusEncoding::default(),
    }
}
