//! Filter micro-language (spec §4.7).
//!
//! A secondary, much smaller grammar used by the generic REST-style list
//! endpoints that sit alongside HRQL — not HRQL's pipe syntax, but a single
//! `op.value` term per field that shares HRQL's [`Condition`] vocabulary so
//! the SQL backend renders both the same way.

use hrql_ast::Error;

use crate::plan::{CmpOp, Condition, Value};

/// Parses `<op>.<value>` (spec §4.7) into a [`Condition`] over `chain`.
///
/// `in.a,b,c` splits its value on commas; `is.null` / `is.not_null` produce
/// an [`Condition::IsNullFilter`]; anything else is rendered as a plain
/// string value, matching the REST filter's untyped wire format.
pub fn parse_filter(chain: Vec<String>, raw: &str) -> Result<Condition, Error> {
    let (op, value) = raw.split_once('.').ok_or_else(|| {
        Error::parse(
            format!("malformed filter `{raw}`; expected `<op>.<value>`"),
            hrql_ast::Span::new(0, 0),
        )
    })?;

    match op {
        "eq" => Ok(field_cmp(chain, CmpOp::Eq, value)),
        "neq" => Ok(field_cmp(chain, CmpOp::Neq, value)),
        "gt" => Ok(field_cmp(chain, CmpOp::Gt, value)),
        "gte" => Ok(field_cmp(chain, CmpOp::Gte, value)),
        "lt" => Ok(field_cmp(chain, CmpOp::Lt, value)),
        "lte" => Ok(field_cmp(chain, CmpOp::Lte, value)),
        "like" => Ok(Condition::LikeFilter {
            chain,
            pattern: value.to_string(),
            case_insensitive: false,
        }),
        "ilike" => Ok(Condition::LikeFilter {
            chain,
            pattern: value.to_string(),
            case_insensitive: true,
        }),
        "in" => {
            let values = value
                .split(',')
                .map(|s| Value::String(s.to_string()))
                .collect();
            Ok(Condition::InFilter { chain, values })
        }
        "is" => match value {
            "null" => Ok(Condition::IsNullFilter { chain, is_null: true }),
            "not_null" => Ok(Condition::IsNullFilter {
                chain,
                is_null: false,
            }),
            other => Err(Error::parse(
                format!("`is.{other}` is not supported; expected `is.null` or `is.not_null`"),
                hrql_ast::Span::new(0, 0),
            )),
        },
        other => Err(Error::parse(
            format!("unknown filter op `{other}`"),
            hrql_ast::Span::new(0, 0),
        )),
    }
}

fn field_cmp(chain: Vec<String>, op: CmpOp, value: &str) -> Condition {
    Condition::FieldCmp {
        chain,
        op,
        value: Value::String(value.to_string()),
    }
}

/// Not part of the Condition vocabulary directly, but named in spec §4.7 as
/// the op set the grammar accepts; kept for callers that want to validate an
/// op string before building the full `op.value` term.
pub const SUPPORTED_OPS: &[&str] = &[
    "eq", "neq", "gt", "gte", "lt", "lte", "like", "ilike", "in", "is",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_eq() {
        let cond = parse_filter(vec!["status".to_string()], "eq.active").unwrap();
        assert_eq!(
            cond,
            Condition::FieldCmp {
                chain: vec!["status".to_string()],
                op: CmpOp::Eq,
                value: Value::String("active".to_string()),
            }
        );
    }

    #[test]
    fn parses_in_list() {
        let cond = parse_filter(vec!["status".to_string()], "in.a,b,c").unwrap();
        let Condition::InFilter { values, .. } = cond else {
            panic!("expected InFilter");
        };
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn parses_is_null() {
        let cond = parse_filter(vec!["manager".to_string()], "is.null").unwrap();
        assert_eq!(
            cond,
            Condition::IsNullFilter {
                chain: vec!["manager".to_string()],
                is_null: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_op() {
        assert!(parse_filter(vec!["status".to_string()], "bogus.x").is_err());
    }

    #[test]
    fn rejects_malformed_term() {
        assert!(parse_filter(vec!["status".to_string()], "noseparator").is_err());
    }

    #[test]
    fn rejects_bad_is_value() {
        assert!(parse_filter(vec!["status".to_string()], "is.maybe").is_err());
    }
}
