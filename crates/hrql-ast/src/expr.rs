//! Abstract syntax tree for HRQL (spec §3, "AST node").
//!
//! This is a closed tagged sum: every consumer (the compiler, the debug
//! printer) matches on [`Node`] exhaustively, so extending the grammar with a
//! new variant surfaces every place that needs updating, following the
//! pattern `prqlc-ast::expr::ExprKind` uses for the same reason.

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

use crate::Span;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, EnumAsInner, Serialize, Deserialize, strum::AsRefStr)]
pub enum NodeKind {
    PipeExpr(PipeExpr),
    FieldAccess(FieldAccess),
    SelfExpr,
    DotExpr,
    IdentExpr(String),
    FuncCall(FuncCall),
    WhereExpr(WhereExpr),
    BinaryOp(BinaryOp),
    UnaryMinus(UnaryMinus),
    Literal(Literal),
    SortExpr(SortExpr),
    PickExpr(PickExpr),
    AggExpr(AggExpr),
}

/// An ordered sequence of pipe steps, length >= 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeExpr {
    pub steps: Vec<Node>,
}

/// A non-empty ordered sequence of identifiers, e.g. `.department.title`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAccess {
    pub chain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereExpr {
    pub cond: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum BinOp {
    And,
    Or,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryOp {
    pub op: BinOp,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryMinus {
    pub inner: Box<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum LiteralKind {
    String,
    Number,
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Already-unescaped text for strings; raw digits for numbers.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortExpr {
    pub field: FieldAccess,
    pub desc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PickOp {
    First,
    Last,
    Nth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickExpr {
    pub op: PickOp,
    /// Only meaningful when `op == Nth`; always positive.
    pub n: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AggOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggExpr {
    pub op: AggOp,
}
