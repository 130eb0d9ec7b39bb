//! Where-condition compilation (spec §4.4.2).
//!
//! Splits into *condition* compilation (produces a [`Condition`]) and *value*
//! compilation (produces a field reference, a literal, or — via the
//! standalone pipe path — a correlated-subquery aggregate recipe).

use hrql_ast::{BinOp, FieldAccess, LiteralKind, Node, NodeKind, WithErrorInfo};
use hrql_ast::Error;

use super::org::resolve_employee_arg;
use super::{resolve_field_chain, CompileCtx, ROOT_OBJECT};
use crate::plan::{CmpOp, Condition, OrgFunc, StringOp, Value};

pub async fn compile_condition(node: &Node, ctx: &CompileCtx<'_>) -> Result<Condition, Error> {
    match &node.kind {
        NodeKind::BinaryOp(b) if b.op == BinOp::And => {
            let left = Box::pin(compile_condition(&b.left, ctx)).await?;
            let right = Box::pin(compile_condition(&b.right, ctx)).await?;
            Ok(left.and(right))
        }
        NodeKind::BinaryOp(b) if b.op == BinOp::Or => {
            let left = Box::pin(compile_condition(&b.left, ctx)).await?;
            let right = Box::pin(compile_condition(&b.right, ctx)).await?;
            Ok(Condition::Or {
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        NodeKind::BinaryOp(b) if is_cmp(b.op) => compile_comparison(node, b, ctx).await,
        NodeKind::PipeExpr(_) => {
            if let Some(cond) = try_string_match(node, ctx)? {
                return Ok(cond);
            }
            Err(Error::semantic(
                "a pipe expression is not a valid boolean condition without a comparison",
            )
            .with_span(Some(node.span)))
        }
        NodeKind::FuncCall(call) if call.name == "reports_to" => {
            if call.args.len() != 2 || call.args[0].kind != NodeKind::DotExpr {
                return Err(Error::semantic(
                    "`reports_to` inside `where` must be written `reports_to(., <employee>)`",
                )
                .with_span(Some(node.span)));
            }
            let target = resolve_employee_arg(&call.args[1], ctx).await?;
            let target_path = ctx.resolver.lookup_path(target, &ctx.cancel).await?;
            Ok(Condition::ReportsTo { target_path })
        }
        _ => Err(Error::semantic("expected a boolean expression").with_span(Some(node.span))),
    }
}

fn is_cmp(op: BinOp) -> bool {
    matches!(
        op,
        BinOp::Eq | BinOp::Neq | BinOp::Gt | BinOp::Gte | BinOp::Lt | BinOp::Lte
    )
}

fn cmp_op_of(op: BinOp) -> CmpOp {
    match op {
        BinOp::Eq => CmpOp::Eq,
        BinOp::Neq => CmpOp::Neq,
        BinOp::Gt => CmpOp::Gt,
        BinOp::Gte => CmpOp::Gte,
        BinOp::Lt => CmpOp::Lt,
        BinOp::Lte => CmpOp::Lte,
        _ => unreachable!("caller filters to comparison operators"),
    }
}

async fn compile_comparison(
    node: &Node,
    b: &hrql_ast::BinaryOp,
    ctx: &CompileCtx<'_>,
) -> Result<Condition, Error> {
    // A `reports(., depth) | [.field |] aggFn <op> literal` correlated
    // aggregate is recognized here: the left side is a pipe matching the
    // subquery pattern, not a plain field comparison (spec §4.4.2).
    if let Some((org_func, depth, agg_func)) = try_subquery_agg(&b.left)? {
        let outer_value = compile_value(&b.right, ctx).await?;
        return Ok(Condition::SubqueryAgg {
            org_func,
            depth,
            agg_func,
            outer_op: cmp_op_of(b.op),
            outer_value,
        });
    }

    let left_field = as_field_access(&b.left);
    let right_field = as_field_access(&b.right);

    match (left_field, right_field) {
        (Some(f), None) => {
            validate_chain(&f.chain, ctx)?;
            let value = compile_value(&b.right, ctx).await?;
            Ok(Condition::FieldCmp {
                chain: f.chain.clone(),
                op: cmp_op_of(b.op),
                value,
            })
        }
        (None, Some(f)) => {
            validate_chain(&f.chain, ctx)?;
            let value = compile_value(&b.left, ctx).await?;
            Ok(Condition::FieldCmp {
                chain: f.chain.clone(),
                op: cmp_op_of(b.op).reversed(),
                value,
            })
        }
        (Some(_), Some(_)) => Err(Error::semantic(
            "cross-field comparison is not supported; compare a field against a literal",
        )
        .with_span(Some(node.span))),
        (None, None) => Err(Error::semantic(
            "a comparison needs a field on exactly one side",
        )
        .with_span(Some(node.span))),
    }
}

fn as_field_access(node: &Node) -> Option<&FieldAccess> {
    match &node.kind {
        NodeKind::FieldAccess(f) => Some(f),
        _ => None,
    }
}

/// Validates that `chain`'s first link is a known field on the root object
/// and every intermediate link is a Lookup field with a resolvable target
/// (spec §3, "Invariants"; spec §7, NameError/SemanticError split).
fn validate_chain(chain: &[String], ctx: &CompileCtx<'_>) -> Result<(), Error> {
    if chain.len() > 2 {
        return Err(Error::semantic("lookup chain exceeds the supported depth of 2"));
    }
    let mut object = ctx
        .catalog
        .get(ROOT_OBJECT)
        .ok_or_else(|| Error::name(format!("unknown object `{ROOT_OBJECT}`")))?;
    for (i, name) in chain.iter().enumerate() {
        let field = object
            .field(name)
            .ok_or_else(|| Error::name(format!("unknown field `{name}` on `{}`", object.api_name)))?;
        let is_last = i + 1 == chain.len();
        if !is_last {
            if !field.is_lookup() {
                return Err(Error::name(format!(
                    "`{name}` is not a Lookup field; cannot continue the chain"
                )));
            }
            let target_id = field
                .lookup_object_id
                .ok_or_else(|| Error::name(format!("`{name}` has no lookup target configured")))?;
            object = ctx
                .catalog
                .get_by_id(target_id)
                .ok_or_else(|| Error::name("lookup target object not found"))?;
        }
    }
    Ok(())
}

async fn compile_value(node: &Node, ctx: &CompileCtx<'_>) -> Result<Value, Error> {
    match &node.kind {
        NodeKind::Literal(lit) => Ok(match lit.kind {
            LiteralKind::String => Value::String(lit.value.clone()),
            LiteralKind::Number => Value::Number(lit.value.clone()),
            LiteralKind::True => Value::Bool(true),
            LiteralKind::False => Value::Bool(false),
        }),
        NodeKind::UnaryMinus(u) => match &u.inner.kind {
            NodeKind::Literal(lit) if lit.kind == LiteralKind::Number => {
                Ok(Value::Number(format!("-{}", lit.value)))
            }
            _ => Err(Error::semantic("unary minus applies only to literals")
                .with_span(Some(node.span))),
        },
        NodeKind::PipeExpr(pipe) if pipe.steps.len() == 2 && pipe.steps[0].kind == NodeKind::SelfExpr => {
            let self_id = ctx.self_id.ok_or_else(|| {
                Error::semantic("`self` requires self_id in the request").with_span(Some(node.span))
            })?;
            let NodeKind::FieldAccess(field) = &pipe.steps[1].kind else {
                return Err(Error::semantic("expected a field access after `self`")
                    .with_span(Some(node.span)));
            };
            let text = resolve_field_chain(ctx, self_id, &field.chain).await?;
            if text.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(text))
            }
        }
        NodeKind::DotExpr => Err(Error::semantic("use `.field`").with_span(Some(node.span))),
        _ => Err(Error::semantic("expected a literal value").with_span(Some(node.span))),
    }
}

/// Matches the string-op pattern `.field | contains("...")` (spec §4.4.2).
/// Validates `field.chain` against the schema exactly as the `FieldCmp` path
/// does (spec §3, "Invariants": "For every FieldCmp/StringMatch, the first
/// chain element is a known field... intermediate elements are Lookup
/// fields").
fn try_string_match(node: &Node, ctx: &CompileCtx<'_>) -> Result<Option<Condition>, Error> {
    let NodeKind::PipeExpr(pipe) = &node.kind else {
        return Ok(None);
    };
    if pipe.steps.len() != 2 {
        return Ok(None);
    }
    let NodeKind::FieldAccess(field) = &pipe.steps[0].kind else {
        return Ok(None);
    };
    let NodeKind::FuncCall(call) = &pipe.steps[1].kind else {
        return Ok(None);
    };
    let op = match call.name.as_str() {
        "contains" => StringOp::Contains,
        "starts_with" => StringOp::StartsWith,
        "ends_with" => StringOp::EndsWith,
        _ => return Ok(None),
    };
    let [arg] = call.args.as_slice() else {
        return Ok(None);
    };
    let NodeKind::Literal(lit) = &arg.kind else {
        return Err(Error::semantic(format!("`{}` expects a string literal", call.name))
            .with_span(Some(arg.span)));
    };
    if lit.kind != LiteralKind::String {
        return Err(Error::semantic(format!("`{}` expects a string literal", call.name))
            .with_span(Some(arg.span)));
    }
    validate_chain(&field.chain, ctx)?;
    Ok(Some(Condition::StringMatch {
        chain: field.chain.clone(),
        op,
        pattern: lit.value.clone(),
    }))
}

/// Matches the correlated-subquery pattern `reports(., depth) | [.field |]
/// aggFn` (spec §4.4.2; only `reports` is a supported correlated source).
fn try_subquery_agg(node: &Node) -> Result<Option<(OrgFunc, u64, hrql_ast::AggOp)>, Error> {
    let NodeKind::PipeExpr(pipe) = &node.kind else {
        return Ok(None);
    };
    let NodeKind::FuncCall(call) = &pipe.steps[0].kind else {
        return Ok(None);
    };
    if call.name != "reports" {
        return Ok(None);
    }
    if call.args.is_empty() || call.args[0].kind != NodeKind::DotExpr {
        return Ok(None);
    }
    let depth = match call.args.get(1) {
        Some(n) => super::org::resolve_int_literal(n)? as u64,
        None => 0,
    };
    let agg = match &pipe.steps[1..] {
        [agg_node] => extract_agg(agg_node),
        [field_node, agg_node] => {
            if !matches!(field_node.kind, NodeKind::FieldAccess(_)) {
                return Ok(None);
            }
            extract_agg(agg_node)
        }
        _ => None,
    };
    Ok(agg.map(|op| (OrgFunc::Reports, depth, op)))
}

fn extract_agg(node: &Node) -> Option<hrql_ast::AggOp> {
    match &node.kind {
        NodeKind::AggExpr(a) => Some(a.op),
        _ => None,
    }
}
