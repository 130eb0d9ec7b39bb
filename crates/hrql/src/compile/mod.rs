//! AST -> [`crate::plan::Plan`] (spec §4.4, "Semantic Compiler").
//!
//! The compiler is synchronous in spirit but awaits [`crate::resolver::Resolver`]
//! calls, so the whole pipeline is `async`: a `Plan` of kind Scalar always
//! carries a non-empty `agg_func`; a `Boolean` plan carries either a
//! resolved `bool_result` or a `ReportsTo` condition (spec §3,
//! "Invariants").

mod org;
mod where_compile;

use std::sync::Arc;

use hrql_ast::{Error, Node, NodeKind, WithErrorInfo};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::plan::{AggOp, Order, Plan, PlanKind};
use crate::resolver::Resolver;
use crate::schema::CatalogTable;

/// HRQL compiles a single root object: employees (spec §1, "a storage-agnostic
/// execution plan that a SQL backend converts to a single parameterized
/// query against a relational store").
pub const ROOT_OBJECT: &str = "employees";

pub struct CompileCtx<'a> {
    pub catalog: Arc<CatalogTable>,
    pub resolver: &'a dyn Resolver,
    pub self_id: Option<Uuid>,
    pub cancel: CancellationToken,
}

pub async fn compile(
    ast: &Node,
    catalog: Arc<CatalogTable>,
    resolver: &dyn Resolver,
    self_id: Option<Uuid>,
    cancel: CancellationToken,
) -> Result<Plan, Error> {
    let ctx = CompileCtx {
        catalog,
        resolver,
        self_id,
        cancel,
    };

    let NodeKind::PipeExpr(pipe) = &ast.kind else {
        return Err(Error::semantic("the compiled expression must be a pipe"));
    };

    let mut steps = pipe.steps.iter();
    let first = steps
        .next()
        .ok_or_else(|| Error::semantic("a pipe must contain at least one step"))?;

    log::trace!("compiling pipe with {} step(s)", pipe.steps.len());
    let mut plan = initial_step(first, &ctx).await?;

    let mut pending_field: Option<Vec<String>> = None;
    for step in steps {
        crate::resolver::check_cancelled(&ctx.cancel)?;
        apply_step(&mut plan, step, &mut pending_field, &ctx).await?;
    }

    plan.normalize();
    log::debug!("compiled plan: kind={:?} conditions={}", plan.kind, plan.conditions.len());
    Ok(plan)
}

async fn initial_step(node: &Node, ctx: &CompileCtx<'_>) -> Result<Plan, Error> {
    match &node.kind {
        NodeKind::SelfExpr => {
            let id = ctx.self_id.ok_or_else(|| {
                Error::semantic("`self` requires self_id in the request").with_span(Some(node.span))
            })?;
            let mut plan = Plan::list(ROOT_OBJECT);
            plan.push_condition(crate::plan::Condition::IdentityFilter { id: id.to_string() });
            plan.limit = 1;
            Ok(plan)
        }
        NodeKind::IdentExpr(name) if name == ROOT_OBJECT => Ok(Plan::list(ROOT_OBJECT)),
        NodeKind::IdentExpr(name) => Err(Error::name(format!("unknown identifier `{name}`")).with_span(Some(node.span))),
        NodeKind::FuncCall(call) => org::compile_org_call(call, ctx).await,
        _ => Err(Error::semantic("a pipe must start with `employees`, `self`, or a function call")
            .with_span(Some(node.span))),
    }
}

async fn apply_step(
    plan: &mut Plan,
    node: &Node,
    pending_field: &mut Option<Vec<String>>,
    ctx: &CompileCtx<'_>,
) -> Result<(), Error> {
    match &node.kind {
        NodeKind::FieldAccess(f) => {
            *pending_field = Some(f.chain.clone());
            Ok(())
        }
        NodeKind::WhereExpr(w) => {
            if plan.kind != PlanKind::List {
                return Err(Error::semantic("`where` can only follow a list-shaped step")
                    .with_span(Some(node.span)));
            }
            let cond = where_compile::compile_condition(&w.cond, ctx).await?;
            plan.push_condition(cond);
            Ok(())
        }
        NodeKind::SortExpr(s) => {
            if s.field.chain.len() != 1 {
                return Err(Error::semantic(
                    "`sort_by` only supports a direct field on the root object",
                )
                .with_span(Some(node.span)));
            }
            let field_name = &s.field.chain[0];
            let root = ctx
                .catalog
                .get(ROOT_OBJECT)
                .ok_or_else(|| Error::name(format!("unknown object `{ROOT_OBJECT}`")))?;
            root.field(field_name).ok_or_else(|| {
                Error::name(format!("unknown field `{field_name}` on `{ROOT_OBJECT}`"))
                    .with_span(Some(node.span))
            })?;
            plan.order = Some(Order {
                field_api_name: field_name.clone(),
                desc: s.desc,
            });
            Ok(())
        }
        NodeKind::PickExpr(p) => {
            use hrql_ast::PickOp;
            match p.op {
                PickOp::First => plan.limit = 1,
                PickOp::Last => {
                    plan.limit = 1;
                    match &mut plan.order {
                        Some(o) => o.desc = !o.desc,
                        None => {
                            plan.order = Some(Order {
                                field_api_name: "id".to_string(),
                                desc: true,
                            })
                        }
                    }
                }
                PickOp::Nth => {
                    let n = p.n.expect("parser guarantees a positive n for `nth`");
                    plan.limit = 1;
                    plan.offset = n - 1;
                }
            }
            plan.pick_op = Some(p.op);
            plan.pick_n = p.n;
            Ok(())
        }
        NodeKind::AggExpr(a) => {
            plan.kind = PlanKind::Scalar;
            plan.agg_func = Some(a.op);
            plan.agg_field = pending_field.take().map(|chain| chain.join("."));
            Ok(())
        }
        NodeKind::FuncCall(call) => match call.name.as_str() {
            "unique" | "upper" | "lower" => Ok(()),
            "length" => {
                plan.kind = PlanKind::Scalar;
                plan.agg_func = Some(AggOp::Count);
                Ok(())
            }
            "contains" | "starts_with" | "ends_with" => Err(Error::semantic(format!(
                "`{}` is only valid inside `where(...)`",
                call.name
            ))
            .with_span(Some(node.span))),
            other => Err(Error::semantic(format!("`{other}` cannot appear as a pipe step here"))
                .with_span(Some(node.span))),
        },
        _ => Err(Error::semantic("unexpected pipe step").with_span(Some(node.span))),
    }
}

/// Walks a dot-joined field chain starting at `start_id`, following each
/// intermediate hop through [`Resolver::lookup_field_value`] and parsing it
/// as a [`Uuid`]. Shared by `self.<chain>` employee-argument resolution
/// (spec §4.4.1) and `self.<field>` value pre-resolution (spec §4.4.2).
pub(crate) async fn resolve_field_chain(
    ctx: &CompileCtx<'_>,
    start_id: Uuid,
    chain: &[String],
) -> Result<String, Error> {
    let mut current_id = start_id;
    for (i, field) in chain.iter().enumerate() {
        crate::resolver::check_cancelled(&ctx.cancel)?;
        let value = ctx
            .resolver
            .lookup_field_value(current_id, field, &ctx.cancel)
            .await?;
        let is_last = i + 1 == chain.len();
        if is_last {
            return Ok(value);
        }
        current_id = Uuid::parse_str(&value)
            .map_err(|_| Error::semantic(format!("`{field}` is not a Lookup field value")))?;
    }
    unreachable!("chain is non-empty by construction")
}
