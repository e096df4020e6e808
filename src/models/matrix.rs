//! Ranked test-by-build result matrix returned to the dashboard.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use super::{BuildRecord, StatusEncoding};

/// One matrix column: a job slot within a build. Serialized as `[build_id, slot]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MatrixColumn(pub i64, pub usize);

impl MatrixColumn {
    pub fn build_id(&self) -> i64 {
        self.0
    }

    pub fn job_slot(&self) -> usize {
        self.1
    }
}

/// Dense, ranked outcome matrix.
///
/// `index[i]` names the test in row `data[i]`; `data[i][j]` is the encoded
/// status of that test in `columns[j]`. Columns are build-major with builds in
/// descending id order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ResultMatrix {
    #[schema(value_type = Vec<Vec<i64>>)]
    pub columns: Vec<MatrixColumn>,
    /// Test identifiers, most unstable first
    pub index: Vec<String>,
    /// Encoded statuses, one row per test
    pub data: Vec<Vec<u8>>,
    /// Build metadata keyed by build id
    #[schema(value_type = Object)]
    pub metadata: BTreeMap<i64, BuildRecord>,
    pub encoding: StatusEncoding,
}

impl ResultMatrix {
    /// Encoded row for a test, if present.
    pub fn row(&self, test: &str) -> Option<&[u8]> {
        self.index
            .iter()
            .position(|t| t == test)
            .map(|i| self.data[i].as_slice())
    }

    /// Build ids covered by the matrix, newest first.
    pub fn build_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for column in &self.columns {
            if ids.last() != Some(&column.build_id()) {
                ids.push(column.build_id());
            }
        }
        ids
    }
}
