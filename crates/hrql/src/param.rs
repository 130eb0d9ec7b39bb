//! SQL parameter values (grounded in `postrust_sql::param::SqlParam`).

use serde::{Deserialize, Serialize};

use crate::plan::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&Value> for SqlParam {
    fn from(v: &Value) -> Self {
        match v {
            Value::String(s) => SqlParam::Text(s.clone()),
            Value::Number(n) => SqlParam::Text(n.clone()),
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Null => SqlParam::Null,
        }
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::Text(s)
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }
}

impl From<i64> for SqlParam {
    fn from(n: i64) -> Self {
        SqlParam::Int(n)
    }
}
