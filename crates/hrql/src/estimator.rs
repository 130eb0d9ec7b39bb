//! Two-phase cardinality estimator (spec §4.6).
//!
//! Phase one always runs: the planner's own row estimate, extracted from
//! `EXPLAIN (FORMAT JSON)`. Phase two — an exact `count(*)` — only runs when
//! phase one's estimate is small enough to make an exact count cheap; on any
//! failure of the exact count it silently falls back to the estimate, per
//! spec. Estimator errors in phase one propagate as `ErrorKind::Estimator`
//! (spec §7).
//!
//! The actual query execution is a capability the caller supplies, the same
//! shape as [`crate::resolver::Resolver`] — this crate never opens a
//! connection (spec §1, "connection pooling" is out of scope).

use async_trait::async_trait;
use hrql_ast::Error;
use serde_json::Value as Json;

use crate::param::SqlParam;
use crate::plan::Plan;
use crate::schema::CatalogTable;
use crate::sql::{build_count_query, build_estimate_query};

/// Above this row-count estimate, an exact count is skipped as too expensive
/// (spec §4.6).
pub const EXACT_COUNT_THRESHOLD: u64 = 50_000;

/// Runs the two queries the estimator needs against a real connection.
/// Production code backs this with a pooled database client; tests use
/// [`crate::testing::MemoryExecutor`].
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs `sql` (already prefixed with `EXPLAIN (FORMAT JSON)` by the
    /// caller) and returns the single JSON value the planner emits.
    async fn explain_json(&self, sql: &str, params: &[SqlParam]) -> Result<Json, Error>;

    /// Runs an exact `count(*)` query and returns the scalar result.
    async fn count(&self, sql: &str, params: &[SqlParam]) -> Result<i64, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountEstimate {
    pub value: i64,
    /// `true` when `value` is an exact `count(*)`; `false` when it is the
    /// planner's row estimate (spec §4.6).
    pub exact: bool,
}

/// Runs the two-phase estimate for a List plan's conditions (spec §4.6).
pub async fn estimate_count(
    plan: &Plan,
    catalog: &CatalogTable,
    executor: &dyn QueryExecutor,
) -> Result<CountEstimate, Error> {
    let estimate_query = build_estimate_query(plan, catalog)?;
    let explain_sql = format!("EXPLAIN (FORMAT JSON) {}", estimate_query.sql);
    log::trace!("estimator: running planner estimate");
    let json = executor
        .explain_json(&explain_sql, &estimate_query.params)
        .await
        .map_err(|e| Error::estimator(format!("planner estimate failed: {e}")))?;
    let estimate = extract_plan_rows(&json)?;

    if estimate > EXACT_COUNT_THRESHOLD {
        log::debug!("estimator: estimate {estimate} exceeds threshold, skipping exact count");
        return Ok(CountEstimate {
            value: estimate as i64,
            exact: false,
        });
    }

    let count_query = build_count_query(plan, catalog)?;
    match executor.count(&count_query.sql, &count_query.params).await {
        Ok(exact) => Ok(CountEstimate {
            value: exact,
            exact: true,
        }),
        Err(err) => {
            log::warn!("estimator: exact count failed, falling back to estimate: {err}");
            Ok(CountEstimate {
                value: estimate as i64,
                exact: false,
            })
        }
    }
}

/// Pulls `Plan.Plan Rows` out of the top-level JSON array `EXPLAIN (FORMAT
/// JSON)` returns (spec §6, "a JSON plan with a top-level `Plan.Plan Rows`
/// numeric estimate").
fn extract_plan_rows(json: &Json) -> Result<u64, Error> {
    let node = json
        .get(0)
        .and_then(|v| v.get("Plan"))
        .and_then(|v| v.get("Plan Rows"))
        .ok_or_else(|| Error::estimator("EXPLAIN output missing Plan.Plan Rows"))?;
    node.as_u64()
        .or_else(|| node.as_f64().map(|f| f.max(0.0) as u64))
        .ok_or_else(|| Error::estimator("Plan.Plan Rows is not numeric"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plan_rows_from_explain_shape() {
        let json: Json = serde_json::from_str(
            r#"[{"Plan": {"Node Type": "Seq Scan", "Plan Rows": 1234}}]"#,
        )
        .unwrap();
        assert_eq!(extract_plan_rows(&json).unwrap(), 1234);
    }

    #[test]
    fn rejects_missing_plan_rows() {
        let json: Json = serde_json::from_str(r#"[{"Plan": {}}]"#).unwrap();
        assert!(extract_plan_rows(&json).is_err());
    }
}
