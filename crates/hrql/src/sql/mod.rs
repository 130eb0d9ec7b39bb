//! Plan -> SQL translator (spec §4.5).
//!
//! Emits a single parameterized statement against a store supporting
//! `ltree`, JSON row-shaping, and `EXPLAIN (FORMAT JSON)`. All identifier
//! insertion goes through [`ident::quote_ident`] (spec §9, "security-critical
//! invariant").

pub mod cursor;
pub mod ident;
mod lateral;

use hrql_ast::{AggOp, Error};

use crate::param::SqlParam;
use crate::plan::{CmpOp, Condition, Plan, PlanKind, StringOp, Value};
use crate::schema::{CatalogTable, FieldType, ObjectDef};
use cursor::Cursor;
use ident::{quote_ident, quote_qualified};

pub use lateral::{Expansion, ExpansionField};

/// Fixed alias for the root employee table (spec §4.5, "Table source").
pub const ROOT_ALIAS: &str = "_e";

#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

pub(crate) struct Builder {
    sql: String,
    params: Vec<SqlParam>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, s: &str) -> &mut Self {
        self.sql.push_str(s);
        self
    }

    pub(crate) fn push_param(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.params.push(value.into());
        self.sql.push('$');
        self.sql.push_str(&self.params.len().to_string());
        self
    }

    pub(crate) fn push_param_cast(&mut self, value: impl Into<SqlParam>, cast: &str) -> &mut Self {
        self.push_param(value);
        self.sql.push_str("::");
        self.sql.push_str(cast);
        self
    }

    fn finish(self) -> SqlQuery {
        SqlQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Translates a storage-agnostic `Plan` into a parameterized SQL statement
/// plus its ordered argument vector (spec §4.5). `cursor` is the decoded
/// keyset-pagination cursor from a prior page, applied only to List plans.
pub fn translate(
    plan: &Plan,
    catalog: &CatalogTable,
    expansions: &[Expansion],
    cursor: Option<&Cursor>,
) -> Result<SqlQuery, Error> {
    let object = catalog
        .get(&plan.root_object)
        .ok_or_else(|| Error::translation(format!("unknown object `{}`", plan.root_object)))?;

    let mut b = Builder::new();
    match plan.kind {
        PlanKind::Scalar => translate_scalar(&mut b, plan, &object, catalog)?,
        PlanKind::Boolean => translate_boolean(&mut b, plan)?,
        PlanKind::List => translate_list(&mut b, plan, &object, expansions, catalog, cursor)?,
    }
    Ok(b.finish())
}

/// Builds `SELECT 1 FROM ... WHERE ...` for a List plan's conditions, with
/// order/limit/offset dropped — the shape the count estimator wraps in an
/// `EXPLAIN (FORMAT JSON)` prefix (spec §4.6).
pub fn build_estimate_query(plan: &Plan, catalog: &CatalogTable) -> Result<SqlQuery, Error> {
    let object = catalog
        .get(&plan.root_object)
        .ok_or_else(|| Error::translation(format!("unknown object `{}`", plan.root_object)))?;
    let mut b = Builder::new();
    b.push("SELECT 1 ");
    from_clause(&mut b, &object)?;
    push_where(&mut b, plan, &object, catalog, base_predicate(&object), None)?;
    Ok(b.finish())
}

/// Builds `SELECT count(*) FROM ... WHERE ...` for the same conditions — the
/// exact-count query the estimator runs only when the estimate is small
/// enough (spec §4.6).
pub fn build_count_query(plan: &Plan, catalog: &CatalogTable) -> Result<SqlQuery, Error> {
    let object = catalog
        .get(&plan.root_object)
        .ok_or_else(|| Error::translation(format!("unknown object `{}`", plan.root_object)))?;
    let mut b = Builder::new();
    b.push("SELECT count(*) ");
    from_clause(&mut b, &object)?;
    push_where(&mut b, plan, &object, catalog, base_predicate(&object), None)?;
    Ok(b.finish())
}

fn from_clause(b: &mut Builder, object: &ObjectDef) -> Result<(), Error> {
    if object.is_standard {
        let schema = object
            .storage_schema
            .as_deref()
            .ok_or_else(|| Error::translation("standard object missing storage_schema"))?;
        let table = object
            .storage_table
            .as_deref()
            .ok_or_else(|| Error::translation("standard object missing storage_table"))?;
        b.push("FROM ").push(&quote_qualified(schema, table));
        b.push(" AS ").push(ROOT_ALIAS);
    } else {
        b.push("FROM metadata.records AS ").push(ROOT_ALIAS);
    }
    Ok(())
}

fn base_predicate(object: &ObjectDef) -> Option<Condition> {
    if object.is_standard {
        None
    } else {
        Some(Condition::FieldCmp {
            chain: vec!["object_id".to_string()],
            op: CmpOp::Eq,
            value: Value::String(object.id.to_string()),
        })
    }
}

fn translate_scalar(b: &mut Builder, plan: &Plan, object: &ObjectDef, catalog: &CatalogTable) -> Result<(), Error> {
    let agg = plan
        .agg_func
        .ok_or_else(|| Error::translation("Scalar plan missing agg_func"))?;
    b.push("SELECT ");
    match agg {
        AggOp::Count => {
            b.push("count(*)");
        }
        other => {
            let field_name = plan
                .agg_field
                .as_deref()
                .ok_or_else(|| Error::translation("aggregate other than count requires a field"))?;
            let field = object
                .field(field_name)
                .ok_or_else(|| Error::translation(format!("unknown field `{field_name}`")))?;
            b.push(agg_fn_name(other));
            b.push("(");
            push_field_expr(b, object, ROOT_ALIAS, field_name, field.field_type, ExprContext::WhereOrder);
            b.push(")");
        }
    }
    b.push(" ");
    from_clause(b, object)?;
    push_where(b, plan, object, catalog, base_predicate(object), None)?;
    Ok(())
}

fn agg_fn_name(op: AggOp) -> &'static str {
    match op {
        AggOp::Count => "count",
        AggOp::Sum => "sum",
        AggOp::Avg => "avg",
        AggOp::Min => "min",
        AggOp::Max => "max",
    }
}

fn translate_boolean(b: &mut Builder, plan: &Plan) -> Result<(), Error> {
    if let Some(result) = plan.bool_result {
        b.push("SELECT ").push(if result { "true" } else { "false" });
        return Ok(());
    }
    // A Boolean plan with no resolved literal carries exactly one condition
    // to execute, per spec §3: "Boolean carries either a resolved
    // bool_result or a ReportsTo-style condition to execute".
    let cond = plan
        .conditions
        .first()
        .ok_or_else(|| Error::translation("Boolean plan has neither bool_result nor a condition"))?;
    b.push("SELECT EXISTS (SELECT 1 FROM core.employees AS ")
        .push(ROOT_ALIAS)
        .push(" WHERE ");
    push_condition(b, cond, ROOT_ALIAS);
    b.push(")");
    Ok(())
}

fn translate_list(
    b: &mut Builder,
    plan: &Plan,
    object: &ObjectDef,
    expansions: &[Expansion],
    catalog: &CatalogTable,
    cursor: Option<&Cursor>,
) -> Result<(), Error> {
    b.push("SELECT ");
    b.push(&lateral::build_row_json(object, ROOT_ALIAS, expansions));
    b.push(" AS row, ");
    push_field_expr(b, object, ROOT_ALIAS, "id", FieldType::Text, ExprContext::WhereOrder);
    b.push("::text AS cursor_id");
    if let Some(order) = &plan.order {
        b.push(", ");
        let field = object
            .field(&order.field_api_name)
            .ok_or_else(|| Error::translation(format!("unknown order field `{}`", order.field_api_name)))?;
        push_field_expr(b, object, ROOT_ALIAS, &order.field_api_name, field.field_type, ExprContext::WhereOrder);
        b.push("::text AS cursor_order_value");
    }
    b.push(" ");
    from_clause(b, object)?;
    lateral::push_lateral_joins(b, object, ROOT_ALIAS, expansions, catalog)?;
    push_where(b, plan, object, catalog, base_predicate(object), cursor)?;

    if let Some(order) = &plan.order {
        b.push(" ORDER BY ");
        let field = object
            .field(&order.field_api_name)
            .ok_or_else(|| Error::translation(format!("unknown order field `{}`", order.field_api_name)))?;
        push_field_expr(b, object, ROOT_ALIAS, &order.field_api_name, field.field_type, ExprContext::WhereOrder);
        b.push(if order.desc { " DESC, " } else { " ASC, " });
        push_field_expr(b, object, ROOT_ALIAS, "id", FieldType::Text, ExprContext::WhereOrder);
        b.push(if order.desc { " DESC" } else { " ASC" });
    } else {
        b.push(" ORDER BY ");
        push_field_expr(b, object, ROOT_ALIAS, "id", FieldType::Text, ExprContext::WhereOrder);
        b.push(" ASC");
    }

    // Request one extra row so the caller can detect "more pages" (spec
    // §4.5, "Keyset pagination").
    if plan.limit > 0 {
        b.push(" LIMIT ").push_param((plan.limit + 1) as i64);
    }
    if plan.offset > 0 {
        b.push(" OFFSET ").push_param(plan.offset as i64);
    }
    Ok(())
}

fn push_where(
    b: &mut Builder,
    plan: &Plan,
    object: &ObjectDef,
    catalog: &CatalogTable,
    base: Option<Condition>,
    cursor: Option<&Cursor>,
) -> Result<(), Error> {
    let mut conds: Vec<&Condition> = Vec::new();
    if let Some(base) = base.as_ref() {
        conds.push(base);
    }
    conds.extend(plan.conditions.iter());

    let mut wrote = false;
    if !conds.is_empty() {
        b.push(" WHERE ");
        wrote = true;
        for (i, cond) in conds.iter().enumerate() {
            if i > 0 {
                b.push(" AND ");
            }
            push_condition_typed(b, cond, object, catalog)?;
        }
    }

    if let Some(cursor) = cursor {
        b.push(if wrote { " AND " } else { " WHERE " });
        push_cursor_predicate(b, plan, object, cursor)?;
    }
    Ok(())
}

/// Renders the keyset-pagination predicate for a decoded [`Cursor`] (spec
/// §4.5, "Keyset pagination"): `(order_col, id) > (?, ?)` — `<` when the
/// plan sorts descending — or plain `id > ?` when the plan has no sort.
fn push_cursor_predicate(b: &mut Builder, plan: &Plan, object: &ObjectDef, cursor: &Cursor) -> Result<(), Error> {
    let Some(order) = &plan.order else {
        b.push("(");
        push_field_expr(b, object, ROOT_ALIAS, "id", FieldType::Text, ExprContext::WhereOrder);
        b.push(" > ");
        b.push_param(cursor.id.clone());
        b.push(")");
        return Ok(());
    };
    let order_value = cursor
        .order_value
        .clone()
        .ok_or_else(|| Error::translation("cursor is missing an order value for a sorted plan"))?;
    let field = object
        .field(&order.field_api_name)
        .ok_or_else(|| Error::translation(format!("unknown order field `{}`", order.field_api_name)))?;
    let op = if order.desc { "<" } else { ">" };

    b.push("(");
    push_field_expr(b, object, ROOT_ALIAS, &order.field_api_name, field.field_type, ExprContext::WhereOrder);
    b.push(", ");
    push_field_expr(b, object, ROOT_ALIAS, "id", FieldType::Text, ExprContext::WhereOrder);
    b.push(") ").push(op).push(" (");
    b.push_param(order_value);
    b.push(", ");
    b.push_param(cursor.id.clone());
    b.push(")");
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprContext {
    Select,
    WhereOrder,
}

/// Renders a field reference for a root-object column: a direct column for
/// standard objects, a JSON accessor for custom objects (spec §4.5, "Field
/// expressions"). Numeric/temporal custom-object fields in a where/order
/// context are parenthesized and cast so comparisons sort and compare
/// correctly rather than as text.
pub(crate) fn push_field_expr(
    b: &mut Builder,
    object: &ObjectDef,
    alias: &str,
    field_name: &str,
    ty: FieldType,
    ctx: ExprContext,
) {
    // `id` and `object_id` are real columns on every row table, standard or
    // custom — only business fields on custom objects live inside `data`.
    if object.is_standard || field_name == "id" || field_name == "object_id" {
        b.push(alias).push(".").push(&quote_ident(field_name));
        return;
    }
    let op = match ctx {
        ExprContext::Select => "->",
        ExprContext::WhereOrder => "->>",
    };
    let needs_cast = ctx == ExprContext::WhereOrder && (ty.is_numeric() || ty.is_temporal());
    if needs_cast {
        b.push("(");
    }
    b.push(alias).push(".data").push(op);
    b.push("'").push(field_name).push("'");
    if needs_cast {
        let cast = if ty.is_numeric() { "decimal" } else { "timestamptz" };
        b.push(")::").push(cast);
    }
}

fn push_condition(b: &mut Builder, cond: &Condition, alias: &str) {
    match cond {
        Condition::FieldCmp { chain, op, value } => {
            render_chain_ref(b, chain, alias);
            b.push(" ").push(op.as_sql()).push(" ");
            push_value_param(b, value);
        }
        Condition::StringMatch { chain, op, pattern } => {
            render_chain_ref(b, chain, alias);
            b.push(" LIKE ");
            let wrapped = match op {
                StringOp::Contains => format!("%{pattern}%"),
                StringOp::StartsWith => format!("{pattern}%"),
                StringOp::EndsWith => format!("%{pattern}"),
            };
            b.push_param(wrapped);
        }
        Condition::IdentityFilter { id } => {
            b.push(alias).push(".").push(&quote_ident("id")).push(" = ");
            b.push_param_cast(id.clone(), "uuid");
        }
        Condition::NullFilter => {
            b.push("false");
        }
        Condition::And { left, right } => {
            b.push("(");
            push_condition(b, left, alias);
            b.push(" AND ");
            push_condition(b, right, alias);
            b.push(")");
        }
        Condition::Or { left, right } => {
            b.push("(");
            push_condition(b, left, alias);
            b.push(" OR ");
            push_condition(b, right, alias);
            b.push(")");
        }
        Condition::OrgChainUp { path, steps } => {
            b.push(alias).push(".manager_path = subpath(");
            b.push_param_cast(path.clone(), "ltree");
            b.push(", 0, nlevel(");
            b.push_param_cast(path.clone(), "ltree");
            b.push(") - ");
            b.push_param(*steps as i64);
            b.push(")");
        }
        Condition::OrgChainDown { path, depth } => {
            b.push(alias).push(".manager_path <@ ");
            b.push_param_cast(path.clone(), "ltree");
            b.push(" AND nlevel(").push(alias).push(".manager_path) = nlevel(");
            b.push_param_cast(path.clone(), "ltree");
            b.push(") + ");
            b.push_param(*depth as i64);
        }
        Condition::OrgChainAll { path } => {
            let ancestors = ancestor_ids(path);
            if ancestors.is_empty() {
                b.push("false");
            } else {
                b.push(alias).push(".").push(&quote_ident("id")).push(" IN (");
                for (i, id) in ancestors.iter().enumerate() {
                    if i > 0 {
                        b.push(", ");
                    }
                    b.push_param_cast(id.clone(), "uuid");
                }
                b.push(")");
            }
        }
        Condition::OrgSubtree { path } => {
            b.push(alias).push(".manager_path <@ ");
            b.push_param_cast(path.clone(), "ltree");
            b.push(" AND ").push(alias).push(".manager_path != ");
            b.push_param_cast(path.clone(), "ltree");
        }
        Condition::SameFieldCond {
            field,
            value,
            exclude_id,
        } => {
            b.push(alias).push(".").push(&quote_ident(field)).push(" = ");
            push_value_param(b, value);
            b.push(" AND ").push(alias).push(".").push(&quote_ident("id")).push(" != ");
            b.push_param_cast(exclude_id.clone(), "uuid");
        }
        Condition::ReportsTo { target_path } => {
            b.push(alias).push(".manager_path <@ ");
            b.push_param_cast(target_path.clone(), "ltree");
            b.push(" AND ").push(alias).push(".manager_path != ");
            b.push_param_cast(target_path.clone(), "ltree");
        }
        Condition::SubqueryAgg {
            org_func: _,
            depth,
            agg_func,
            outer_op,
            outer_value,
        } => {
            b.push("(SELECT ").push(agg_fn_name(*agg_func)).push("(*) FROM core.employees _sub_e WHERE _sub_e.manager_path <@ ");
            b.push(alias).push(".manager_path");
            if *depth > 0 {
                b.push(" AND nlevel(_sub_e.manager_path) = nlevel(").push(alias).push(".manager_path) + ");
                b.push_param(*depth as i64);
            } else {
                b.push(" AND _sub_e.manager_path != ").push(alias).push(".manager_path");
            }
            b.push(") ").push(outer_op.as_sql()).push(" ");
            push_value_param(b, outer_value);
        }
        Condition::InFilter { chain, values } => {
            render_chain_ref(b, chain, alias);
            b.push(" IN (");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                push_value_param(b, v);
            }
            b.push(")");
        }
        Condition::IsNullFilter { chain, is_null } => {
            render_chain_ref(b, chain, alias);
            b.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
        }
        Condition::LikeFilter {
            chain,
            pattern,
            case_insensitive,
        } => {
            render_chain_ref(b, chain, alias);
            b.push(if *case_insensitive { " ILIKE " } else { " LIKE " });
            b.push_param(pattern.clone());
        }
    }
}

/// Like [`push_condition`], but resolves `FieldCmp`/`StringMatch`/filter
/// chains against the schema so length-2 chains render as a lookup
/// subquery (spec §4.5, "Lookup-chain comparisons").
fn push_condition_typed(b: &mut Builder, cond: &Condition, object: &ObjectDef, catalog: &CatalogTable) -> Result<(), Error> {
    match cond {
        Condition::FieldCmp { chain, op, value } if chain.len() == 2 => {
            render_lookup_chain_value(b, object, catalog, chain)?;
            b.push(" ").push(op.as_sql()).push(" ");
            push_value_param(b, value);
            Ok(())
        }
        Condition::FieldCmp { chain, op, value } if chain.len() == 1 => {
            push_root_field(b, object, &chain[0])?;
            b.push(" ").push(op.as_sql()).push(" ");
            push_value_param(b, value);
            Ok(())
        }
        Condition::StringMatch { chain, op, pattern } if chain.len() == 1 => {
            push_root_field(b, object, &chain[0])?;
            b.push(" LIKE ");
            let wrapped = match op {
                StringOp::Contains => format!("%{pattern}%"),
                StringOp::StartsWith => format!("{pattern}%"),
                StringOp::EndsWith => format!("%{pattern}"),
            };
            b.push_param(wrapped);
            Ok(())
        }
        Condition::StringMatch { chain, op, pattern } if chain.len() == 2 => {
            render_lookup_chain_value(b, object, catalog, chain)?;
            b.push(" LIKE ");
            let wrapped = match op {
                StringOp::Contains => format!("%{pattern}%"),
                StringOp::StartsWith => format!("{pattern}%"),
                StringOp::EndsWith => format!("%{pattern}"),
            };
            b.push_param(wrapped);
            Ok(())
        }
        Condition::InFilter { chain, values } if chain.len() == 1 => {
            push_root_field(b, object, &chain[0])?;
            b.push(" IN (");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    b.push(", ");
                }
                push_value_param(b, v);
            }
            b.push(")");
            Ok(())
        }
        Condition::IsNullFilter { chain, is_null } if chain.len() == 1 => {
            push_root_field(b, object, &chain[0])?;
            b.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
            Ok(())
        }
        Condition::LikeFilter {
            chain,
            pattern,
            case_insensitive,
        } if chain.len() == 1 => {
            push_root_field(b, object, &chain[0])?;
            b.push(if *case_insensitive { " ILIKE " } else { " LIKE " });
            b.push_param(pattern.clone());
            Ok(())
        }
        Condition::And { left, right } => {
            b.push("(");
            push_condition_typed(b, left, object, catalog)?;
            b.push(" AND ");
            push_condition_typed(b, right, object, catalog)?;
            b.push(")");
            Ok(())
        }
        Condition::Or { left, right } => {
            b.push("(");
            push_condition_typed(b, left, object, catalog)?;
            b.push(" OR ");
            push_condition_typed(b, right, object, catalog)?;
            b.push(")");
            Ok(())
        }
        other if matches!(other, Condition::FieldCmp { chain, .. } if chain.len() > 2) => {
            Err(Error::translation("lookup chains deeper than 2 are not supported"))
        }
        other if matches!(other, Condition::StringMatch { chain, .. } if chain.len() > 2) => {
            Err(Error::translation("lookup chains deeper than 2 are not supported"))
        }
        other => {
            push_condition(b, other, ROOT_ALIAS);
            Ok(())
        }
    }
}

/// Resolves a single-segment chain against the root object's own fields,
/// rendering `id`/`object_id` as bare columns even for custom objects.
fn push_root_field(b: &mut Builder, object: &ObjectDef, field_name: &str) -> Result<(), Error> {
    if field_name == "id" || field_name == "object_id" {
        push_field_expr(b, object, ROOT_ALIAS, field_name, FieldType::Text, ExprContext::WhereOrder);
        return Ok(());
    }
    let field = object
        .field(field_name)
        .ok_or_else(|| Error::translation(format!("unknown field `{field_name}`")))?;
    push_field_expr(b, object, ROOT_ALIAS, field_name, field.field_type, ExprContext::WhereOrder);
    Ok(())
}

/// `chain.len() == 2` lookup comparison: `(SELECT target_col FROM
/// target_table sub WHERE sub.id = outer.fk_col)` (spec §4.5).
fn render_lookup_chain_value(
    b: &mut Builder,
    object: &ObjectDef,
    catalog: &CatalogTable,
    chain: &[String],
) -> Result<(), Error> {
    let fk_field = object
        .field(&chain[0])
        .ok_or_else(|| Error::translation(format!("unknown field `{}`", chain[0])))?;
    if !fk_field.is_lookup() {
        return Err(Error::translation(format!("`{}` is not a Lookup field", chain[0])));
    }
    let target_id = fk_field
        .lookup_object_id
        .ok_or_else(|| Error::translation(format!("`{}` has no lookup target", chain[0])))?;
    let target = catalog
        .get_by_id(target_id)
        .ok_or_else(|| Error::translation(format!("lookup target of `{}` is not in the catalog", chain[0])))?;
    let target_field = target
        .field(&chain[1])
        .ok_or_else(|| Error::translation(format!("unknown field `{}` on `{}`", chain[1], target.api_name)))?;
    let fk_column = fk_field
        .storage_column
        .clone()
        .unwrap_or_else(|| chain[0].clone());
    b.push("(SELECT ");
    push_field_expr(b, &target, "sub", &chain[1], target_field.field_type, ExprContext::WhereOrder);
    b.push(" FROM ");
    if target.is_standard {
        let schema = target
            .storage_schema
            .as_deref()
            .ok_or_else(|| Error::translation("standard lookup target missing storage_schema"))?;
        let table = target
            .storage_table
            .as_deref()
            .ok_or_else(|| Error::translation("standard lookup target missing storage_table"))?;
        b.push(&quote_qualified(schema, table));
    } else {
        b.push("metadata.records");
    }
    b.push(" AS sub WHERE sub.").push(&quote_ident("id")).push(" = ");
    push_field_expr(b, object, ROOT_ALIAS, &fk_column, FieldType::Text, ExprContext::WhereOrder);
    if !target.is_standard {
        b.push(" AND sub.object_id = ");
        b.push_param_cast(target.id.to_string(), "uuid");
    }
    b.push(")");
    Ok(())
}

fn render_chain_ref(b: &mut Builder, chain: &[String], alias: &str) {
    b.push(alias).push(".").push(&quote_ident(&chain.join("__")));
}

fn push_value_param(b: &mut Builder, value: &Value) {
    match value {
        Value::Null => {
            b.push("NULL");
        }
        other => {
            b.push_param(SqlParam::from(other));
        }
    }
}

/// Decomposes an `ltree` path's 32-char hex labels back into hyphenated
/// UUIDs (spec §4.5, "OrgChainAll"). Per spec §8, a label that is not 32
/// characters is returned unchanged (`ltreeLabelToUUID` boundary behavior).
pub fn ltree_label_to_uuid(label: &str) -> String {
    if label.len() != 32 || !label.chars().all(|c| c.is_ascii_hexdigit()) {
        return label.to_string();
    }
    format!(
        "{}-{}-{}-{}-{}",
        &label[0..8],
        &label[8..12],
        &label[12..16],
        &label[16..20],
        &label[20..32]
    )
}

fn ancestor_ids(path: &str) -> Vec<String> {
    let labels: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if labels.len() <= 1 {
        return Vec::new();
    }
    labels.iter().map(|l| ltree_label_to_uuid(l)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltree_label_to_uuid_rehyphenates_32_char_hex() {
        let label = "aaaaaaaaaaaa4aaaaaaaaaaaaaaaaaaa";
        let uuid = ltree_label_to_uuid(label);
        assert_eq!(uuid.len(), 36);
        assert!(uuid.contains('-'));
    }

    #[test]
    fn ltree_label_to_uuid_passes_through_other_lengths() {
        assert_eq!(ltree_label_to_uuid("short"), "short");
    }

    #[test]
    fn quote_ident_used_everywhere() {
        assert_eq!(ident::quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
