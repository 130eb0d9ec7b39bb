//! End-to-end scenarios from the component specification: parse, compile
//! against the bundled fixture catalog, and check the Plan shape and the
//! translated SQL fragment.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use hrql::plan::{CmpOp, Condition, PlanKind};
use hrql::schema::SharedCatalog;
use hrql::testing::{fixture_catalog, MemoryResolver};
use hrql::{compile, sql, ErrorKind};
use hrql_ast::AggOp;

async fn compile_expr(
    expr: &str,
    self_id: Option<Uuid>,
    resolver: &MemoryResolver,
) -> hrql::Result<hrql::plan::Plan> {
    let ast = hrql_parser::parse(expr).expect("parses");
    let catalog = Arc::new(fixture_catalog());
    compile::compile(&ast, catalog, resolver, self_id, CancellationToken::new()).await
}

#[tokio::test]
async fn scenario_1_count_of_full_time_employees() {
    let resolver = MemoryResolver::new();
    let plan = compile_expr(
        r#"employees | where(.employment_type == "full_time") | count"#,
        None,
        &resolver,
    )
    .await
    .unwrap();

    assert_eq!(plan.kind, PlanKind::Scalar);
    assert_eq!(plan.agg_func, Some(AggOp::Count));
    assert_eq!(plan.agg_field, None);
    assert_eq!(
        plan.conditions,
        vec![Condition::FieldCmp {
            chain: vec!["employment_type".to_string()],
            op: CmpOp::Eq,
            value: hrql::plan::Value::String("full_time".to_string()),
        }]
    );

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("count(*)"));
    assert!(query.sql.contains("employment_type"));
    assert_eq!(query.params.len(), 1);
}

#[tokio::test]
async fn scenario_2_reports_with_depth() {
    let target = Uuid::new_v4();
    let resolver = MemoryResolver::new().with_path(
        target,
        "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
    );
    let plan = compile_expr(&format!("reports(\"{target}\", 1)"), None, &resolver)
        .await
        .unwrap();

    assert_eq!(plan.kind, PlanKind::List);
    assert_eq!(
        plan.conditions,
        vec![Condition::OrgChainDown {
            path: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
            depth: 1,
        }]
    );

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("<@"));
    assert!(query.sql.contains("nlevel"));
}

#[tokio::test]
async fn scenario_3_reports_to_in_where() {
    let target = Uuid::new_v4();
    let self_id = Uuid::new_v4();
    let resolver = MemoryResolver::new()
        .with_path(target, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string())
        .with_path(self_id, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.cccccccccccccccccccccccccccccccc".to_string());
    let plan = compile_expr(
        &format!(r#"employees | where(reports_to(., "{target}"))"#),
        Some(self_id),
        &resolver,
    )
    .await
    .unwrap();

    assert_eq!(plan.kind, PlanKind::List);
    assert_eq!(
        plan.conditions,
        vec![Condition::ReportsTo {
            target_path: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
        }]
    );

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("<@"));
    assert!(query.sql.contains("!="));
}

#[tokio::test]
async fn scenario_4_correlated_subquery_aggregate() {
    let self_id = Uuid::new_v4();
    let resolver = MemoryResolver::new().with_path(self_id, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string());
    let plan = compile_expr(
        "employees | where(reports(., 1) | count > 0)",
        Some(self_id),
        &resolver,
    )
    .await
    .unwrap();

    assert_eq!(plan.kind, PlanKind::List);
    assert_eq!(plan.conditions.len(), 1);
    assert!(matches!(
        &plan.conditions[0],
        Condition::SubqueryAgg {
            org_func: hrql::plan::OrgFunc::Reports,
            depth: 1,
            agg_func: AggOp::Count,
            outer_op: CmpOp::Gt,
            ..
        }
    ));

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("count(*)"));
    assert!(query.sql.contains("<@"));
}

#[tokio::test]
async fn scenario_5_lookup_chain_comparison() {
    let resolver = MemoryResolver::new();
    let plan = compile_expr(r#"employees | where(.department.title == "Eng")"#, None, &resolver)
        .await
        .unwrap();

    assert_eq!(
        plan.conditions,
        vec![Condition::FieldCmp {
            chain: vec!["department".to_string(), "title".to_string()],
            op: CmpOp::Eq,
            value: hrql::plan::Value::String("Eng".to_string()),
        }]
    );

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("SELECT"));
    assert!(query.sql.contains("departments"));
    assert!(query.sql.contains("sub"));
}

#[tokio::test]
async fn scenario_6_self_is_identity_filter_with_limit_one() {
    let self_id = Uuid::new_v4();
    let resolver = MemoryResolver::new();
    let plan = compile_expr("self", Some(self_id), &resolver).await.unwrap();

    assert_eq!(plan.kind, PlanKind::List);
    assert_eq!(plan.limit, 1);
    assert_eq!(
        plan.conditions,
        vec![Condition::IdentityFilter { id: self_id.to_string() }]
    );

    let catalog = fixture_catalog();
    let query = sql::translate(&plan, &catalog, &[], None).unwrap();
    assert!(query.sql.contains("LIMIT $1"));
    assert_eq!(query.params.last().unwrap(), &hrql::param::SqlParam::from(2i64));
}

#[tokio::test]
async fn error_self_without_self_id_is_semantic() {
    let resolver = MemoryResolver::new();
    let err = compile_expr("self", None, &resolver).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
}

#[tokio::test]
async fn error_unknown_field_is_name_error() {
    let resolver = MemoryResolver::new();
    let err = compile_expr("employees | where(.nonexistent == 1)", None, &resolver)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Name);
}

#[tokio::test]
async fn error_peers_of_self_without_self_id_is_semantic() {
    let resolver = MemoryResolver::new();
    let err = compile_expr("peers(self)", None, &resolver).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
}

#[test]
fn error_nth_zero_is_parse_error() {
    let err = hrql_parser::parse("employees | nth(0)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[tokio::test]
async fn error_contains_outside_where_is_semantic() {
    let resolver = MemoryResolver::new();
    let err = compile_expr(r#"employees | contains("x")"#, None, &resolver)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Semantic);
}

#[tokio::test]
async fn chain_steps_past_root_yields_null_filter() {
    let emp = Uuid::new_v4();
    let resolver = MemoryResolver::new().with_path(emp, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string());
    let plan = compile_expr(&format!("chain(\"{emp}\", 5)"), None, &resolver)
        .await
        .unwrap();
    assert_eq!(plan.conditions, vec![Condition::NullFilter]);
}

#[tokio::test]
async fn peers_with_null_manager_yields_null_filter() {
    let emp = Uuid::new_v4();
    let resolver = MemoryResolver::new();
    let plan = compile_expr(&format!("peers(\"{emp}\")"), None, &resolver)
        .await
        .unwrap();
    assert_eq!(plan.conditions, vec![Condition::NullFilter]);
}

#[tokio::test]
async fn last_with_no_sort_produces_id_desc() {
    let resolver = MemoryResolver::new();
    let plan = compile_expr("employees | last", None, &resolver).await.unwrap();
    assert_eq!(plan.limit, 1);
    let order = plan.order.unwrap();
    assert_eq!(order.field_api_name, "id");
    assert!(order.desc);
}

#[tokio::test]
async fn nth_sets_offset_and_limit_one() {
    let resolver = MemoryResolver::new();
    let plan = compile_expr("employees | nth(3)", None, &resolver).await.unwrap();
    assert_eq!(plan.limit, 1);
    assert_eq!(plan.offset, 2);
}

#[test]
fn shared_catalog_reads_the_current_snapshot() {
    let shared = SharedCatalog::new(fixture_catalog());
    let snapshot = shared.snapshot();
    assert!(snapshot.get("employees").is_some());
}
