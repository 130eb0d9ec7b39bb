use hrql_ast::{BinOp, ErrorKind, LiteralKind, NodeKind, PickOp};
use hrql_parser::parse;

fn steps(src: &str) -> Vec<NodeKind> {
    let ast = parse(src).unwrap();
    let NodeKind::PipeExpr(pipe) = ast.kind else {
        panic!("expected a top-level pipe");
    };
    pipe.steps.into_iter().map(|n| n.kind).collect()
}

#[test]
fn bare_identifier_is_a_single_step_pipe() {
    let s = steps("employees");
    assert_eq!(s.len(), 1);
    assert!(matches!(&s[0], NodeKind::IdentExpr(name) if name == "employees"));
}

#[test]
fn self_dot_field_desugars_to_two_step_pipe() {
    let s = steps("self.manager");
    assert_eq!(s.len(), 2);
    assert!(matches!(s[0], NodeKind::SelfExpr));
    match &s[1] {
        NodeKind::FieldAccess(f) => assert_eq!(f.chain, vec!["manager".to_string()]),
        other => panic!("expected FieldAccess, got {other:?}"),
    }
}

#[test]
fn self_dot_field_then_outer_pipe_keeps_flattened_steps() {
    let s = steps("self.manager | first");
    assert_eq!(s.len(), 3);
    assert!(matches!(s[0], NodeKind::SelfExpr));
    assert!(matches!(&s[1], NodeKind::FieldAccess(_)));
    assert!(matches!(
        &s[2],
        NodeKind::PickExpr(p) if p.op == PickOp::First
    ));
}

#[test]
fn where_body_parses_boolean_and_comparison() {
    let s = steps(r#"employees | where(.a == "x" and .b != 1)"#);
    assert_eq!(s.len(), 2);
    let NodeKind::WhereExpr(w) = &s[1] else {
        panic!("expected WhereExpr");
    };
    let NodeKind::BinaryOp(b) = &w.cond.kind else {
        panic!("expected BinaryOp at the top of the where body");
    };
    assert_eq!(b.op, BinOp::And);
}

#[test]
fn comparison_precedence_binds_tighter_than_and() {
    // `.a > 1 and .b < 2` must parse as `(.a > 1) and (.b < 2)`, not as a
    // single flattened comparison chain.
    let s = steps("employees | where(.a > 1 and .b < 2)");
    let NodeKind::WhereExpr(w) = &s[1] else {
        panic!("expected WhereExpr");
    };
    let NodeKind::BinaryOp(top) = &w.cond.kind else {
        panic!("expected a BinaryOp");
    };
    assert_eq!(top.op, BinOp::And);
    assert!(matches!(&top.left.kind, NodeKind::BinaryOp(b) if b.op == BinOp::Gt));
    assert!(matches!(&top.right.kind, NodeKind::BinaryOp(b) if b.op == BinOp::Lt));
}

#[test]
fn unary_minus_applies_to_numeric_literal() {
    let s = steps("employees | where(.a == -5)");
    let NodeKind::WhereExpr(w) = &s[1] else {
        panic!("expected WhereExpr");
    };
    let NodeKind::BinaryOp(b) = &w.cond.kind else {
        panic!("expected BinaryOp");
    };
    match &b.right.kind {
        NodeKind::UnaryMinus(u) => assert!(matches!(&u.inner.kind, NodeKind::Literal(l) if l.kind == LiteralKind::Number)),
        other => panic!("expected UnaryMinus, got {other:?}"),
    }
}

#[test]
fn sort_by_defaults_to_ascending() {
    let s = steps("employees | sort_by(.start_date)");
    let NodeKind::SortExpr(sort) = &s[1] else {
        panic!("expected SortExpr");
    };
    assert!(!sort.desc);
    assert_eq!(sort.field.chain, vec!["start_date".to_string()]);
}

#[test]
fn sort_by_accepts_desc_keyword() {
    let s = steps("employees | sort_by(.start_date, desc)");
    let NodeKind::SortExpr(sort) = &s[1] else {
        panic!("expected SortExpr");
    };
    assert!(sort.desc);
}

#[test]
fn nth_requires_positive_integer() {
    let err = parse("employees | nth(0)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn nth_parses_positive_integer() {
    let s = steps("employees | nth(4)");
    let NodeKind::PickExpr(p) = &s[1] else {
        panic!("expected PickExpr");
    };
    assert_eq!(p.op, PickOp::Nth);
    assert_eq!(p.n, Some(4));
}

#[test]
fn unregistered_function_call_is_an_error() {
    let err = parse("bogus(1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn registry_validates_call_arity() {
    // `peers` takes exactly one Employee argument.
    let err = parse("peers(self, 1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn unterminated_string_is_lexical_error() {
    let err = parse(r#"employees | where(.a == "unterminated)"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[test]
fn bare_equals_is_a_lexical_error() {
    let err = parse("employees | where(.a = 1)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[test]
fn trailing_tokens_after_top_level_pipe_are_rejected() {
    let err = parse("employees )").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn expression_over_the_byte_limit_is_rejected_before_lexing() {
    let huge = format!("employees | where(.a == \"{}\")", "x".repeat(200));
    let err = hrql_parser::parse_with_limit(&huge, 32).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn dot_alone_is_dot_expr() {
    let s = steps("employees | where(reports_to(., self))");
    let NodeKind::WhereExpr(w) = &s[1] else {
        panic!("expected WhereExpr");
    };
    let NodeKind::FuncCall(call) = &w.cond.kind else {
        panic!("expected FuncCall for reports_to");
    };
    assert!(matches!(call.args[0].kind, NodeKind::DotExpr));
}

#[test]
fn round_trip_ast_shape_is_stable_across_reparse() {
    let src = r#"employees | where(.department.title == "Eng" and reports_to(., self)) | sort_by(.start_date, desc) | first"#;
    let first = parse(src).unwrap();
    let second = parse(src).unwrap();
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}
