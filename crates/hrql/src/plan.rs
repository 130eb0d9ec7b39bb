//! Storage-agnostic intermediate representation (spec §3, "Plan").
//!
//! `Plan` is the stable contract between the front half (lexer, parser,
//! compiler) and the back half (SQL backend, count estimator) — it carries
//! no SQL, just the abstract recipe the backend renders (spec §4.4,
//! "Semantic Compiler").

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

pub use hrql_ast::{AggOp, PickOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PlanKind {
    List,
    Scalar,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CmpOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    /// Flips the operator for the "literal < .field" rewrite into "field >
    /// literal" (spec §8, "Boundary behaviors").
    pub fn reversed(self) -> CmpOp {
        match self {
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Neq => CmpOp::Neq,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Gte => CmpOp::Lte,
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Lte => CmpOp::Gte,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Neq => "!=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StringOp {
    Contains,
    StartsWith,
    EndsWith,
}

/// A scalar value attached to a [`Condition`]. Kept distinct from
/// [`hrql_ast::Literal`] because pre-resolved `self.field` values and numeric
/// literals both end up here as plain text the backend later casts
/// (spec §4.4.2, "a `self.<field>` shorthand in value position is
/// pre-resolved").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Number(String),
    Bool(bool),
    Null,
}

/// The stable condition vocabulary (spec §3, "Condition").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumAsInner)]
pub enum Condition {
    FieldCmp {
        chain: Vec<String>,
        op: CmpOp,
        value: Value,
    },
    StringMatch {
        chain: Vec<String>,
        op: StringOp,
        pattern: String,
    },
    IdentityFilter {
        id: String,
    },
    /// Always false — the normalized representation of "no such row can
    /// satisfy this" (e.g. `chain(e, steps)` past the root).
    NullFilter,
    And {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    Or {
        left: Box<Condition>,
        right: Box<Condition>,
    },
    OrgChainUp {
        path: String,
        steps: u64,
    },
    OrgChainDown {
        path: String,
        depth: u64,
    },
    OrgChainAll {
        path: String,
    },
    OrgSubtree {
        path: String,
    },
    SameFieldCond {
        field: String,
        value: Value,
        exclude_id: String,
    },
    ReportsTo {
        target_path: String,
    },
    SubqueryAgg {
        org_func: OrgFunc,
        depth: u64,
        agg_func: AggOp,
        outer_op: CmpOp,
        outer_value: Value,
    },
    InFilter {
        chain: Vec<String>,
        values: Vec<Value>,
    },
    IsNullFilter {
        chain: Vec<String>,
        is_null: bool,
    },
    LikeFilter {
        chain: Vec<String>,
        pattern: String,
        case_insensitive: bool,
    },
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        Condition::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }
}

/// Only `reports` is a supported correlated source (spec §4.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum OrgFunc {
    Reports,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub field_api_name: String,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub kind: PlanKind,
    pub conditions: Vec<Condition>,
    pub order: Option<Order>,
    /// 0 means "no override".
    pub limit: u64,
    /// Row offset for `nth(n)`, resolving the open question in spec §9:
    /// `nth(n)` addresses the n-th row via `limit = 1, offset = n - 1`.
    pub offset: u64,
    pub pick_op: Option<PickOp>,
    pub pick_n: Option<u64>,
    pub agg_func: Option<AggOp>,
    pub agg_field: Option<String>,
    pub bool_result: Option<bool>,
    /// Root object of the query, set once at plan creation; the SQL backend
    /// needs it to resolve the table source and never needs a second catalog
    /// lookup for it.
    pub root_object: String,
}

impl Plan {
    pub fn list(root_object: impl Into<String>) -> Self {
        Plan {
            kind: PlanKind::List,
            conditions: Vec::new(),
            order: None,
            limit: 0,
            offset: 0,
            pick_op: None,
            pick_n: None,
            agg_func: None,
            agg_field: None,
            bool_result: None,
            root_object: root_object.into(),
        }
    }

    pub fn boolean(root_object: impl Into<String>, result: Option<bool>) -> Self {
        let mut plan = Plan::list(root_object);
        plan.kind = PlanKind::Boolean;
        plan.bool_result = result;
        plan
    }

    pub fn push_condition(&mut self, cond: Condition) {
        self.conditions.push(cond);
    }

    /// Normalizes `NullFilter and X -> NullFilter` at the top level (spec §8,
    /// "optional" fold named in the testable properties).
    pub fn normalize(&mut self) {
        if self.conditions.iter().any(|c| matches!(c, Condition::NullFilter)) {
            self.conditions = vec![Condition::NullFilter];
        }
    }
}
