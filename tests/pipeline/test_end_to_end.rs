//! Ingestion followed by aggregation.

use ci_test_tracker::error::AppError;
use ci_test_tracker::models::MatrixColumn;
use ci_test_tracker::services::Aggregator;

use crate::test_helpers::{ScriptedProvider, ingestor, job_log, new_store};

#[tokio::test]
async fn test_single_build_two_jobs() {
    let provider = ScriptedProvider::new()
        .build(100, "0123456789abcdef", "Add test_x", &[1, 2])
        .log(1, job_log("ray/tests/test_x.py::test_ok PASSED"))
        .log(2, job_log("no test output here"));
    let store = new_store();

    let summary = ingestor(provider, &store).ingest(25).await.unwrap();
    assert_eq!(summary.builds, 1);
    assert_eq!(summary.jobs, 2);
    assert_eq!(summary.jobs_with_outcomes, 1);
    assert_eq!(summary.outcomes, 1);

    let matrix = Aggregator::new(store).aggregate(1).await.unwrap();
    assert_eq!(matrix.columns, vec![MatrixColumn(100, 0), MatrixColumn(100, 1)]);
    assert_eq!(matrix.index, vec!["ray/tests/test_x.py::test_ok"]);
    assert_eq!(matrix.data, vec![vec![0, 3]]);
    assert_eq!(matrix.metadata[&100].short_sha, "012345");
    assert_eq!(matrix.metadata[&100].commit_message, "Add test_x");
}

#[tokio::test]
async fn test_mixed_dialects_across_builds_rank_failures_first() {
    let provider = ScriptedProvider::new()
        // Newest build: Bazel summary, colored
        .build(300, "cccccccccccc", "Switch to bazel", &[31, 32])
        .log(
            31,
            job_log(
                "\x1b[32m//python/ray/tests:test_basic\x1b[0m  PASSED in 12.1s\n\
                 \x1b[31m//python/ray/tests:test_actor\x1b[0m  TIMEOUT in 900.0s",
            ),
        )
        .log(32, "null")
        // Older build: pytest-sugar
        .build(200, "bbbbbbbbbbbb", "Use pytest-sugar", &[21])
        .log(
            21,
            job_log(
                " ray.tests.test_basic::test_submit ✓    50% █████\n\
                 \u{20}ray.tests.test_actor::test_kill ⨯   100% ██████████",
            ),
        )
        // Oldest build: verbose pytest, log fetch fails for the second job
        .build(100, "aaaaaaaaaaaa", "Initial", &[11, 12])
        .log(
            11,
            job_log(
                "python/ray/tests/test_basic.py::test_submit PASSED [ 50%]\n\
                 python/ray/tests/test_basic.py::test_skip SKIPPED [100%]",
            ),
        );
    let store = new_store();

    let summary = ingestor(provider, &store).ingest(25).await.unwrap();
    assert_eq!(summary.builds, 3);
    assert_eq!(summary.jobs, 5);
    assert_eq!(summary.failed_fetches, 2);

    let matrix = Aggregator::new(store).aggregate(10).await.unwrap();
    assert_eq!(matrix.build_ids(), vec![300, 200, 100]);
    assert_eq!(matrix.columns.len(), 3 * 2);
    for row in &matrix.data {
        assert_eq!(row.len(), 6);
    }

    // Both failing tests outrank everything else
    assert_eq!(
        &matrix.index[..2],
        &["python/ray/tests:test_actor", "ray::tests.test_actor::test_kill"]
    );
    assert_eq!(
        matrix.row("python/ray/tests:test_actor").unwrap(),
        &[1, 3, 3, 3, 3, 3]
    );
    assert_eq!(
        matrix.row("ray::tests.test_actor::test_kill").unwrap(),
        &[3, 3, 1, 3, 3, 3]
    );
    assert_eq!(
        matrix.row("ray/tests/test_basic.py::test_skip").unwrap(),
        &[3, 3, 3, 3, 2, 3]
    );
}

#[tokio::test]
async fn test_reingesting_is_idempotent() {
    let make_provider = || {
        ScriptedProvider::new()
            .build(5, "abcdefabcdef", "Same build", &[50])
            .log(50, job_log("ray/tests/test_y.py::test_a FAILED"))
    };
    let store = new_store();

    ingestor(make_provider(), &store).ingest(25).await.unwrap();
    let first = Aggregator::new(store.clone()).aggregate(10).await.unwrap();
    ingestor(make_provider(), &store).ingest(25).await.unwrap();
    let second = Aggregator::new(store).aggregate(10).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.data, vec![vec![1]]);
}

#[tokio::test]
async fn test_aggregate_before_ingest_is_empty_corpus() {
    let err = Aggregator::new(new_store()).aggregate(10).await.unwrap_err();
    assert!(matches!(err, AppError::EmptyCorpus));
}
