//! In-memory fixtures for tests (spec-adjacent; not itself part of HRQL's
//! contract, but the counterpart of PRQL's `test-dbs` fixtures and
//! postrust's builder-test doubles).
//!
//! Nothing here is exercised by production code paths; it exists so this
//! crate's own tests, and downstream integration tests, can compile HRQL
//! expressions without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hrql_ast::Error;

use crate::estimator::QueryExecutor;
use crate::param::SqlParam;
use crate::resolver::{check_cancelled, not_found, Resolver};
use crate::schema::{CatalogTable, FieldDef, FieldType, ObjectDef};

/// A [`Resolver`] backed by plain maps, configured by the test that builds
/// it. Matches the capability-by-reference shape spec §9 calls for — no
/// global state, no caching.
#[derive(Default)]
pub struct MemoryResolver {
    paths: HashMap<Uuid, String>,
    fields: HashMap<(Uuid, String), String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, id: Uuid, path: impl Into<String>) -> Self {
        self.paths.insert(id, path.into());
        self
    }

    /// An empty `value` models SQL NULL (spec §4.4.3).
    pub fn with_field(mut self, id: Uuid, api_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert((id, api_name.into()), value.into());
        self
    }
}

#[async_trait]
impl Resolver for MemoryResolver {
    async fn lookup_path(&self, id: Uuid, cancel: &CancellationToken) -> Result<String, Error> {
        check_cancelled(cancel)?;
        self.paths.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn lookup_field_value(
        &self,
        id: Uuid,
        api_name: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        check_cancelled(cancel)?;
        Ok(self
            .fields
            .get(&(id, api_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// A [`QueryExecutor`] that returns canned answers, so estimator tests don't
/// need a live planner.
pub struct MemoryExecutor {
    pub plan_rows: u64,
    pub exact_count: Option<i64>,
}

impl MemoryExecutor {
    pub fn with_plan_rows(plan_rows: u64) -> Self {
        MemoryExecutor {
            plan_rows,
            exact_count: Some(plan_rows as i64),
        }
    }

    pub fn exact_count_fails(mut self) -> Self {
        self.exact_count = None;
        self
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn explain_json(&self, _sql: &str, _params: &[SqlParam]) -> Result<Json, Error> {
        Ok(serde_json::json!([{"Plan": {"Plan Rows": self.plan_rows}}]))
    }

    async fn count(&self, _sql: &str, _params: &[SqlParam]) -> Result<i64, Error> {
        self.exact_count
            .ok_or_else(|| Error::estimator("simulated exact-count failure"))
    }
}

/// A small fixture org chart: a standard `employees` object, a standard
/// `departments` object it looks up into, and a custom `training_program`
/// object, mirroring spec §3's standard-vs-custom split.
pub fn fixture_catalog() -> CatalogTable {
    let mut table = CatalogTable::default();

    let department_id = Uuid::parse_str("00000000-0000-0000-0000-000000000d01").unwrap();
    let training_program_id = Uuid::parse_str("00000000-0000-0000-0000-000000000c01").unwrap();

    table.insert(ObjectDef::new(
        department_id,
        "departments",
        true,
        Some("core".to_string()),
        Some("departments".to_string()),
        vec![
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "id".to_string(),
                field_type: FieldType::Text,
                storage_column: Some("id".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "title".to_string(),
                field_type: FieldType::Text,
                storage_column: Some("title".to_string()),
                lookup_object_id: None,
            },
        ],
    ));

    table.insert(ObjectDef::new(
        training_program_id,
        "training_program",
        false,
        None,
        None,
        vec![
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "name".to_string(),
                field_type: FieldType::Text,
                storage_column: None,
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "hours".to_string(),
                field_type: FieldType::Number,
                storage_column: None,
                lookup_object_id: None,
            },
        ],
    ));

    table.insert(ObjectDef::new(
        Uuid::parse_str("00000000-0000-0000-0000-000000000e01").unwrap(),
        "employees",
        true,
        Some("core".to_string()),
        Some("employees".to_string()),
        vec![
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "id".to_string(),
                field_type: FieldType::Text,
                storage_column: Some("id".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "manager".to_string(),
                field_type: FieldType::Text,
                storage_column: Some("manager_id".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "employment_type".to_string(),
                field_type: FieldType::Text,
                storage_column: Some("employment_type".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "start_date".to_string(),
                field_type: FieldType::Date,
                storage_column: Some("start_date".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "salary".to_string(),
                field_type: FieldType::Currency,
                storage_column: Some("salary".to_string()),
                lookup_object_id: None,
            },
            FieldDef {
                id: Uuid::new_v4(),
                api_name: "department".to_string(),
                field_type: FieldType::Lookup,
                storage_column: Some("department_id".to_string()),
                lookup_object_id: Some(department_id),
            },
        ],
    ));

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_resolver_returns_configured_path() {
        let id = Uuid::new_v4();
        let resolver = MemoryResolver::new().with_path(id, "aaaa.bbbb");
        let cancel = CancellationToken::new();
        assert_eq!(resolver.lookup_path(id, &cancel).await.unwrap(), "aaaa.bbbb");
    }

    #[tokio::test]
    async fn memory_resolver_missing_path_is_not_found() {
        let resolver = MemoryResolver::new();
        let cancel = CancellationToken::new();
        let err = resolver.lookup_path(Uuid::new_v4(), &cancel).await.unwrap_err();
        assert_eq!(err.kind, hrql_ast::ErrorKind::Resolver);
    }

    #[test]
    fn fixture_catalog_has_employees_and_lookup_target() {
        let table = fixture_catalog();
        let employees = table.get("employees").unwrap();
        let department_field = employees.field("department").unwrap();
        assert!(department_field.is_lookup());
        let target = table.get_by_id(department_field.lookup_object_id.unwrap()).unwrap();
        assert_eq!(target.api_name, "departments");
    }
}
