//! JSON row shaping and lateral-join expansion (spec §4.5, "Lateral-join
//! expansion", depth <= 2).
//!
//! Each requested Lookup field is expanded into its own `LEFT JOIN LATERAL`
//! producing a single JSON object (or `NULL`), which the row-shaping
//! expression then folds into the top-level `row_to_json`-style output.

use hrql_ast::Error;

use super::ident::{quote_ident, quote_qualified};
use super::{push_field_expr, Builder, ExprContext};
use crate::schema::{CatalogTable, FieldType, ObjectDef};

/// One requested expansion: a Lookup field on the root object, and
/// optionally a nested expansion one level further (depth 2 total).
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub field_api_name: String,
    pub nested: Vec<ExpansionField>,
}

/// A plain field pulled from the expanded (depth-1) object's row, or a
/// further nested Lookup expansion (depth 2).
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionField {
    Field(String),
    Nested(Expansion),
}

impl Expansion {
    pub fn new(field_api_name: impl Into<String>) -> Self {
        Expansion {
            field_api_name: field_api_name.into(),
            nested: Vec::new(),
        }
    }
}

fn alias_for(prefix: &str, field_api_name: &str) -> String {
    format!("{prefix}_{field_api_name}")
}

/// Emits one `LEFT JOIN LATERAL` per requested expansion. The join predicate
/// always binds the target row's `id` to the root row's Lookup column; the
/// join itself is registered so `build_row_json` can reference the alias.
pub fn push_lateral_joins(
    b: &mut Builder,
    object: &ObjectDef,
    root_alias: &str,
    expansions: &[Expansion],
    catalog: &CatalogTable,
) -> Result<(), Error> {
    for expansion in expansions {
        push_one_lateral(b, object, root_alias, expansion, catalog)?;
    }
    Ok(())
}

fn push_one_lateral(
    b: &mut Builder,
    object: &ObjectDef,
    root_alias: &str,
    expansion: &Expansion,
    catalog: &CatalogTable,
) -> Result<(), Error> {
    let field = object.field(&expansion.field_api_name).ok_or_else(|| {
        Error::translation(format!("unknown field `{}`", expansion.field_api_name))
    })?;
    if !field.is_lookup() {
        return Err(Error::translation(format!(
            "`{}` is not a Lookup field; cannot expand it",
            expansion.field_api_name
        )));
    }
    let target_id = field
        .lookup_object_id
        .ok_or_else(|| Error::translation(format!("`{}` has no lookup target", expansion.field_api_name)))?;
    let target = catalog
        .get_by_id(target_id)
        .ok_or_else(|| Error::translation(format!("lookup target of `{}` is not in the catalog", expansion.field_api_name)))?;
    let alias = alias_for(root_alias, &expansion.field_api_name);
    let fk_column = field
        .storage_column
        .clone()
        .unwrap_or_else(|| expansion.field_api_name.clone());

    b.push(" LEFT JOIN LATERAL (SELECT ").push(&alias).push(".* FROM ");
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
    b.push(" AS ").push(&alias).push(" WHERE ").push(&alias).push(".")
        .push(&quote_ident("id")).push(" = ");
    push_field_expr(b, object, root_alias, &fk_column, FieldType::Text, ExprContext::WhereOrder);
    if !target.is_standard {
        b.push(" AND ").push(&alias).push(".object_id = ");
        b.push_param_cast(target.id.to_string(), "uuid");
    }
    b.push(") AS ").push(&alias).push(" ON true");

    for nested in &expansion.nested {
        if let ExpansionField::Nested(inner) = nested {
            push_one_lateral(b, &target, &alias, inner, catalog)?;
        }
    }
    Ok(())
}

/// Builds the JSON row expression selected as `row` for list queries: every
/// scalar field of the root object plus, for each requested expansion, a
/// nested object (or `NULL` if the lateral join found nothing).
pub fn build_row_json(object: &ObjectDef, root_alias: &str, expansions: &[Expansion]) -> String {
    let mut parts = Vec::new();
    parts.push(format!("'id', {root_alias}.{}", quote_ident("id")));
    for field in &object.fields {
        let expr = if object.is_standard {
            format!("{root_alias}.{}", quote_ident(&field.api_name))
        } else {
            format!("{root_alias}.data->'{}'", field.api_name)
        };
        parts.push(format!("'{}', {}", field.api_name, expr));
    }
    for expansion in expansions {
        let alias = alias_for(root_alias, &expansion.field_api_name);
        parts.push(format!(
            "'{}', CASE WHEN {alias}.id IS NOT NULL THEN row_to_json({alias}.*) ELSE NULL END",
            expansion.field_api_name
        ));
    }
    format!("json_build_object({})", parts.join(", "))
}
