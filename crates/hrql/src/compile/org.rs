//! Org functions in source position (spec §4.4.1).

use hrql_ast::{Error, FuncCall, Node, NodeKind, WithErrorInfo};
use uuid::Uuid;

use super::{resolve_field_chain, CompileCtx, ROOT_OBJECT};
use crate::plan::{Condition, Plan, Value};

/// Number of `ltree` labels in a path — the number of ancestors (inclusive
/// of self) from the root down to this employee (spec §4.5, "OrgChainUp").
pub(crate) fn nlevel(path: &str) -> u64 {
    path.split('.').filter(|s| !s.is_empty()).count() as u64
}

pub(crate) fn is_descendant(emp_path: &str, target_path: &str) -> bool {
    emp_path.starts_with(&format!("{target_path}."))
}

pub async fn compile_org_call(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    match call.name.as_str() {
        "chain" => compile_chain(call, ctx).await,
        "reports" => compile_reports(call, ctx).await,
        "peers" => compile_peers(call, ctx).await,
        "colleagues" => compile_colleagues(call, ctx).await,
        "reports_to" => compile_reports_to(call, ctx).await,
        other => Err(Error::semantic(format!(
            "`{other}` cannot start a pipe; it is not an org function"
        ))),
    }
}

async fn compile_chain(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    let emp_id = resolve_employee_arg(&call.args[0], ctx).await?;
    let steps = match call.args.get(1) {
        Some(n) => resolve_int_literal(n)?,
        None => 0,
    };
    let path = ctx.resolver.lookup_path(emp_id, &ctx.cancel).await?;

    let mut plan = Plan::list(ROOT_OBJECT);
    let cond = if steps == 0 {
        Condition::OrgChainAll { path }
    } else if steps as u64 >= nlevel(&path) {
        Condition::NullFilter
    } else {
        Condition::OrgChainUp {
            path,
            steps: steps as u64,
        }
    };
    plan.push_condition(cond);
    Ok(plan)
}

async fn compile_reports(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    let emp_id = resolve_employee_arg(&call.args[0], ctx).await?;
    let depth = match call.args.get(1) {
        Some(n) => resolve_int_literal(n)?,
        None => 0,
    };
    let path = ctx.resolver.lookup_path(emp_id, &ctx.cancel).await?;

    let mut plan = Plan::list(ROOT_OBJECT);
    let cond = if depth == 0 {
        Condition::OrgSubtree { path }
    } else {
        Condition::OrgChainDown {
            path,
            depth: depth as u64,
        }
    };
    plan.push_condition(cond);
    Ok(plan)
}

async fn compile_peers(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    let emp_id = resolve_employee_arg(&call.args[0], ctx).await?;
    let value = ctx
        .resolver
        .lookup_field_value(emp_id, "manager", &ctx.cancel)
        .await?;

    let mut plan = Plan::list(ROOT_OBJECT);
    let cond = if value.is_empty() {
        Condition::NullFilter
    } else {
        Condition::SameFieldCond {
            field: "manager".to_string(),
            value: Value::String(value),
            exclude_id: emp_id.to_string(),
        }
    };
    plan.push_condition(cond);
    Ok(plan)
}

async fn compile_colleagues(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    let emp_id = resolve_employee_arg(&call.args[0], ctx).await?;
    let field_node = &call.args[1];
    let NodeKind::FieldAccess(field) = &field_node.kind else {
        return Err(Error::semantic("`colleagues` expects a single field access, e.g. `.department`")
            .with_span(Some(field_node.span)));
    };
    if field.chain.len() != 1 {
        return Err(Error::semantic("`colleagues` expects a single-element field access")
            .with_span(Some(field_node.span)));
    }
    let field_name = field.chain[0].clone();
    let value = ctx
        .resolver
        .lookup_field_value(emp_id, &field_name, &ctx.cancel)
        .await?;

    let mut plan = Plan::list(ROOT_OBJECT);
    let cond = if value.is_empty() {
        Condition::NullFilter
    } else {
        Condition::SameFieldCond {
            field: field_name,
            value: Value::String(value),
            exclude_id: emp_id.to_string(),
        }
    };
    plan.push_condition(cond);
    Ok(plan)
}

async fn compile_reports_to(call: &FuncCall, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    let emp_id = resolve_employee_arg(&call.args[0], ctx).await?;
    let target_id = resolve_employee_arg(&call.args[1], ctx).await?;
    let emp_path = ctx.resolver.lookup_path(emp_id, &ctx.cancel).await?;
    let target_path = ctx.resolver.lookup_path(target_id, &ctx.cancel).await?;
    let result = is_descendant(&emp_path, &target_path);
    Ok(Plan::boolean(ROOT_OBJECT, Some(result)))
}

/// Resolves an `Employee`-kind argument to a concrete id (spec §4.4.1).
/// Accepts `self`, a UUID-string literal, a bare identifier treated as a
/// UUID, or the `self.<lookup-chain>` shorthand walked through the
/// Resolver.
pub(crate) async fn resolve_employee_arg(node: &Node, ctx: &CompileCtx<'_>) -> Result<Uuid, Error> {
    match &node.kind {
        NodeKind::SelfExpr => ctx
            .self_id
            .ok_or_else(|| Error::semantic("`self` requires self_id in the request").with_span(Some(node.span))),
        NodeKind::Literal(lit) if lit.kind == hrql_ast::LiteralKind::String => {
            parse_uuid(&lit.value, node)
        }
        NodeKind::IdentExpr(name) => parse_uuid(name, node),
        NodeKind::PipeExpr(pipe) if pipe.steps.len() == 2 && pipe.steps[0].kind == NodeKind::SelfExpr => {
            let self_id = ctx
                .self_id
                .ok_or_else(|| Error::semantic("`self` requires self_id in the request").with_span(Some(node.span)))?;
            let NodeKind::FieldAccess(field) = &pipe.steps[1].kind else {
                return Err(Error::semantic("expected a field access after `self`")
                    .with_span(Some(node.span)));
            };
            let value = resolve_field_chain(ctx, self_id, &field.chain).await?;
            parse_uuid(&value, node)
        }
        _ => Err(Error::semantic("expected an employee reference (`self`, an id, or `self.<field>`)")
            .with_span(Some(node.span))),
    }
}

fn parse_uuid(text: &str, node: &Node) -> Result<Uuid, Error> {
    Uuid::parse_str(text)
        .map_err(|_| Error::semantic(format!("`{text}` is not a valid employee id")).with_span(Some(node.span)))
}

pub(crate) fn resolve_int_literal(node: &Node) -> Result<i64, Error> {
    match &node.kind {
        NodeKind::Literal(lit) if lit.kind == hrql_ast::LiteralKind::Number => lit
            .value
            .parse()
            .map_err(|_| Error::semantic("invalid integer literal").with_span(Some(node.span))),
        NodeKind::UnaryMinus(u) => {
            let inner = resolve_int_literal(&u.inner)?;
            Ok(-inner)
        }
        _ => Err(Error::semantic("expected an integer literal").with_span(Some(node.span))),
    }
}
