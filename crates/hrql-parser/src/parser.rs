//! Recursive-descent parser over the token stream (spec §4.2).
//!
//! Precedence climbs low to high: `or < and < comparison < additive <
//! multiplicative < unary minus < primary`. A primary may be followed by one
//! or more `| step` continuations — this is how both the top-level pipe and
//! the correlated-subquery pattern inside `where(...)` (e.g. `reports(., 1)
//! | count > 0`) share one code path: the pipe is just a postfix extension of
//! whatever operand it follows, and the comparison operators above it see
//! the whole pipe as a single value.

use hrql_ast::{
    registry, AggExpr, AggOp, BinOp, BinaryOp, Error, FieldAccess, FuncCall, Literal, LiteralKind,
    Node, NodeKind, PickExpr, PickOp, PipeExpr, SortExpr, Span, Token, TokenKind, UnaryMinus,
    WhereExpr,
};

use crate::lexer::Lexer;

/// Expressions longer than this are rejected before lexing even starts
/// (spec §6: "implementations should reject expressions longer than a
/// configurable threshold (e.g. 64 KiB)").
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024;

pub fn parse(src: &str) -> Result<Node, Error> {
    parse_with_limit(src, DEFAULT_MAX_INPUT_BYTES)
}

pub fn parse_with_limit(src: &str, max_bytes: usize) -> Result<Node, Error> {
    if src.len() > max_bytes {
        return Err(Error::parse(
            format!(
                "expression is {} bytes, exceeding the {max_bytes}-byte limit",
                src.len()
            ),
            Span::new(0, 0),
        ));
    }
    let mut parser = Parser::new(src);
    let node = parser.parse_top_pipe()?;
    parser.expect_eof()?;
    log::trace!("parsed {} byte expression into AST", src.len());
    Ok(node)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(src),
        }
    }

    fn peek(&mut self) -> Result<Token, Error> {
        self.lexer.peek().map(|t| t.clone())
    }

    fn bump(&mut self) -> Result<Token, Error> {
        self.lexer.next()
    }

    fn peek_is(&mut self, kind: TokenKind) -> Result<bool, Error> {
        Ok(self.peek()?.kind == kind)
    }

    fn peek_ident_is(&mut self, text: &str) -> Result<bool, Error> {
        let t = self.peek()?;
        Ok(t.kind == TokenKind::Ident && t.text == text)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, Error> {
        let t = self.bump()?;
        if t.kind == kind {
            Ok(t)
        } else {
            Err(Error::parse(
                format!("unexpected {}, expected {expected}", t.kind),
                t.span,
            ))
        }
    }

    fn expect_eof(&mut self) -> Result<(), Error> {
        let t = self.peek()?;
        if t.kind == TokenKind::Eof {
            Ok(())
        } else {
            Err(Error::parse(
                format!("unexpected {} after end of expression", t.kind),
                t.span,
            ))
        }
    }

    // ---- pipes ----------------------------------------------------------

    fn parse_top_pipe(&mut self) -> Result<Node, Error> {
        let first = self.parse_step()?;
        let steps = self.collect_pipe_steps(first)?;
        let span = span_of(&steps);
        Ok(Node::new(NodeKind::PipeExpr(PipeExpr { steps }), span))
    }

    /// Parses a primary value that may be extended by `| step` continuations
    /// (the comparison-operand form used inside `where(...)`).
    fn parse_pipe_operand(&mut self) -> Result<Node, Error> {
        let first = self.parse_primary()?;
        if !self.peek_is(TokenKind::Pipe)? {
            return Ok(first);
        }
        let steps = self.collect_pipe_steps(first)?;
        let span = span_of(&steps);
        Ok(Node::new(NodeKind::PipeExpr(PipeExpr { steps }), span))
    }

    fn collect_pipe_steps(&mut self, first: Node) -> Result<Vec<Node>, Error> {
        let mut steps = Vec::new();
        push_flattened(&mut steps, first);
        while self.peek_is(TokenKind::Pipe)? {
            self.bump()?;
            let step = self.parse_step()?;
            push_flattened(&mut steps, step);
        }
        Ok(steps)
    }

    /// One element of a pipe: a control form (`where`, `sort_by`, `first`,
    /// `last`, `nth`, an aggregate keyword) or a plain value (falls through
    /// to [`Self::parse_primary`]).
    fn parse_step(&mut self) -> Result<Node, Error> {
        if self.peek_ident_is("where")? {
            return self.parse_where();
        }
        if self.peek_ident_is("sort_by")? {
            return self.parse_sort_by();
        }
        if self.peek_ident_is("first")? {
            let t = self.bump()?;
            return Ok(Node::new(
                NodeKind::PickExpr(PickExpr {
                    op: PickOp::First,
                    n: None,
                }),
                t.span,
            ));
        }
        if self.peek_ident_is("last")? {
            let t = self.bump()?;
            return Ok(Node::new(
                NodeKind::PickExpr(PickExpr {
                    op: PickOp::Last,
                    n: None,
                }),
                t.span,
            ));
        }
        if self.peek_ident_is("nth")? {
            return self.parse_nth();
        }
        if let Some(op) = agg_op_for_ident(&self.peek()?) {
            let t = self.bump()?;
            return Ok(Node::new(NodeKind::AggExpr(AggExpr { op }), t.span));
        }
        self.parse_primary()
    }

    fn parse_where(&mut self) -> Result<Node, Error> {
        let start = self.bump()?; // `where`
        self.expect(TokenKind::LParen, "`(`")?;
        let cond = self.parse_or()?;
        let end = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Node::new(
            NodeKind::WhereExpr(WhereExpr {
                cond: Box::new(cond),
            }),
            start.span.union(end.span),
        ))
    }

    fn parse_sort_by(&mut self) -> Result<Node, Error> {
        let start = self.bump()?; // `sort_by`
        self.expect(TokenKind::LParen, "`(`")?;
        let field = self.parse_field_access_required()?;
        let mut desc = false;
        if self.peek_is(TokenKind::Comma)? {
            self.bump()?;
            let t = self.bump()?;
            match t.kind {
                TokenKind::Asc => desc = false,
                TokenKind::Desc => desc = true,
                _ => {
                    return Err(Error::parse(
                        format!("unexpected {}, expected `asc` or `desc`", t.kind),
                        t.span,
                    ))
                }
            }
        }
        let end = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Node::new(
            NodeKind::SortExpr(SortExpr { field, desc }),
            start.span.union(end.span),
        ))
    }

    fn parse_nth(&mut self) -> Result<Node, Error> {
        let start = self.bump()?; // `nth`
        self.expect(TokenKind::LParen, "`(`")?;
        let num = self.expect(TokenKind::Number, "a positive integer")?;
        let n: u64 = num
            .text
            .parse()
            .map_err(|_| Error::parse("invalid integer literal", num.span))?;
        if n == 0 {
            return Err(Error::parse(
                "`nth` requires a positive integer, found 0",
                num.span,
            ));
        }
        let end = self.expect(TokenKind::RParen, "`)`")?;
        Ok(Node::new(
            NodeKind::PickExpr(PickExpr {
                op: PickOp::Nth,
                n: Some(n),
            }),
            start.span.union(end.span),
        ))
    }

    // ---- boolean / arithmetic precedence chain ---------------------------

    fn parse_or(&mut self) -> Result<Node, Error> {
        let mut left = self.parse_and()?;
        while self.peek_is(TokenKind::Or)? {
            self.bump()?;
            let right = self.parse_and()?;
            left = binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, Error> {
        let mut left = self.parse_cmp()?;
        while self.peek_is(TokenKind::And)? {
            self.bump()?;
            let right = self.parse_cmp()?;
            left = binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Node, Error> {
        let left = self.parse_additive()?;
        let op = match self.peek()?.kind {
            TokenKind::Eq => BinOp::Eq,
            TokenKind::Neq => BinOp::Neq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Gte => BinOp::Gte,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Lte => BinOp::Lte,
            _ => return Ok(left),
        };
        self.bump()?;
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Node, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, Error> {
        if self.peek_is(TokenKind::Minus)? {
            let start = self.bump()?;
            let inner = self.parse_unary()?;
            let span = start.span.union(inner.span);
            return Ok(Node::new(
                NodeKind::UnaryMinus(UnaryMinus {
                    inner: Box::new(inner),
                }),
                span,
            ));
        }
        self.parse_pipe_operand()
    }

    // ---- primaries --------------------------------------------------------

    fn parse_primary(&mut self) -> Result<Node, Error> {
        let t = self.peek()?;
        match t.kind {
            TokenKind::Number => {
                self.bump()?;
                Ok(Node::new(
                    NodeKind::Literal(Literal {
                        kind: LiteralKind::Number,
                        value: t.text,
                    }),
                    t.span,
                ))
            }
            TokenKind::String => {
                self.bump()?;
                Ok(Node::new(
                    NodeKind::Literal(Literal {
                        kind: LiteralKind::String,
                        value: t.text,
                    }),
                    t.span,
                ))
            }
            TokenKind::True => {
                self.bump()?;
                Ok(Node::new(
                    NodeKind::Literal(Literal {
                        kind: LiteralKind::True,
                        value: t.text,
                    }),
                    t.span,
                ))
            }
            TokenKind::False => {
                self.bump()?;
                Ok(Node::new(
                    NodeKind::Literal(Literal {
                        kind: LiteralKind::False,
                        value: t.text,
                    }),
                    t.span,
                ))
            }
            TokenKind::Dot => self.parse_dot(),
            TokenKind::LParen => {
                self.bump()?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::Ident if t.text == "self" => self.parse_self(),
            TokenKind::Ident => self.parse_ident_primary(),
            other => Err(Error::parse(format!("unexpected {other}"), t.span)),
        }
    }

    /// `.` alone is [`NodeKind::DotExpr`]; `.a.b.c` is a [`FieldAccess`].
    fn parse_dot(&mut self) -> Result<Node, Error> {
        let start = self.bump()?; // `.`
        if !self.peek_is(TokenKind::Ident)? {
            return Ok(Node::new(NodeKind::DotExpr, start.span));
        }
        let field = self.parse_field_access_chain()?;
        Ok(Node::new(NodeKind::FieldAccess(field), start.span))
    }

    fn parse_field_access_required(&mut self) -> Result<FieldAccess, Error> {
        self.expect(TokenKind::Dot, "a field access (e.g. `.field`)")?;
        self.parse_field_access_chain()
    }

    fn parse_field_access_chain(&mut self) -> Result<FieldAccess, Error> {
        let mut chain = vec![self.expect(TokenKind::Ident, "a field name")?.text];
        while self.peek_is(TokenKind::Dot)? {
            self.bump()?;
            chain.push(self.expect(TokenKind::Ident, "a field name")?.text);
        }
        Ok(FieldAccess { chain })
    }

    /// `self` alone is [`NodeKind::SelfExpr`]; `self.a.b` desugars into the
    /// two-step pipe `PipeExpr[SelfExpr, FieldAccess]` (spec §4.2).
    fn parse_self(&mut self) -> Result<Node, Error> {
        let start = self.bump()?; // `self`
        if !self.peek_is(TokenKind::Dot)? {
            return Ok(Node::new(NodeKind::SelfExpr, start.span));
        }
        self.bump()?; // `.`
        let field = self.parse_field_access_chain()?;
        let self_node = Node::new(NodeKind::SelfExpr, start.span);
        let field_node = Node::new(NodeKind::FieldAccess(field), start.span);
        Ok(Node::new(
            NodeKind::PipeExpr(PipeExpr {
                steps: vec![self_node, field_node],
            }),
            start.span,
        ))
    }

    fn parse_ident_primary(&mut self) -> Result<Node, Error> {
        let name_tok = self.bump()?;
        let name = name_tok.text.clone();
        let entry = registry::lookup(&name);

        if self.peek_is(TokenKind::LParen)? {
            let Some(entry) = entry else {
                return Err(Error::parse(
                    format!("`{name}` is not a registered function"),
                    name_tok.span,
                ));
            };
            self.bump()?; // `(`
            let args = self.parse_args_list()?;
            let end = self.expect(TokenKind::RParen, "`)`")?;
            if !entry.accepts_arity(args.len()) {
                let (min, max) = entry.arity();
                let expected = if min == max {
                    format!("{min}")
                } else {
                    format!("{min}-{max}")
                };
                return Err(Error::parse(
                    format!(
                        "`{name}` expects {expected} argument(s), found {}",
                        args.len()
                    ),
                    name_tok.span.union(end.span),
                ));
            }
            return Ok(Node::new(
                NodeKind::FuncCall(FuncCall { name, args }),
                name_tok.span.union(end.span),
            ));
        }

        if let Some(entry) = entry {
            if entry.accepts_arity(0) {
                return Ok(Node::new(
                    NodeKind::FuncCall(FuncCall {
                        name,
                        args: Vec::new(),
                    }),
                    name_tok.span,
                ));
            }
            return Err(Error::parse(
                format!("`{name}` requires arguments, e.g. `{name}(...)`"),
                name_tok.span,
            ));
        }

        Ok(Node::new(NodeKind::IdentExpr(name), name_tok.span))
    }

    fn parse_args_list(&mut self) -> Result<Vec<Node>, Error> {
        let mut args = Vec::new();
        if self.peek_is(TokenKind::RParen)? {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.peek_is(TokenKind::Comma)? {
                self.bump()?;
                continue;
            }
            break;
        }
        Ok(args)
    }
}

fn binary(op: BinOp, left: Node, right: Node) -> Node {
    let span = left.span.union(right.span);
    Node::new(
        NodeKind::BinaryOp(BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }),
        span,
    )
}

fn push_flattened(steps: &mut Vec<Node>, node: Node) {
    match node.kind {
        NodeKind::PipeExpr(p) => steps.extend(p.steps),
        kind => steps.push(Node::new(kind, node.span)),
    }
}

fn span_of(steps: &[Node]) -> Span {
    let first = steps.first().expect("at least one pipe step").span;
    let last = steps.last().expect("at least one pipe step").span;
    first.union(last)
}

fn agg_op_for_ident(t: &Token) -> Option<AggOp> {
    if t.kind != TokenKind::Ident {
        return None;
    }
    match t.text.as_str() {
        "count" => Some(AggOp::Count),
        "sum" => Some(AggOp::Sum),
        "avg" => Some(AggOp::Avg),
        "min" => Some(AggOp::Min),
        "max" => Some(AggOp::Max),
        _ => None,
    }
}
