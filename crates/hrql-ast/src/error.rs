//! Error taxonomy shared by every stage of the compiler (spec §7).

use std::fmt::Debug;

use crate::Span;

/// Which stage raised the error. Kept separate from [Reason] so that callers
/// can map errors to the user-visible buckets in spec §7 ("invalid
/// argument" / "not found" / "internal") without string-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    Lexical,
    Parse,
    Name,
    Semantic,
    Resolver,
    Translation,
    Estimator,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub reason: Reason,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Reason {
    Simple(String),
    Expected {
        who: Option<String>,
        expected: String,
        found: String,
    },
    Unexpected {
        found: String,
    },
    NotFound {
        name: String,
        namespace: String,
    },
}

impl Error {
    pub fn new(kind: ErrorKind, reason: Reason) -> Self {
        Error {
            kind,
            span: None,
            reason,
            hints: Vec::new(),
        }
    }

    pub fn simple<S: ToString>(kind: ErrorKind, reason: S) -> Self {
        Error::new(kind, Reason::Simple(reason.to_string()))
    }

    pub fn lexical<S: ToString>(reason: S, span: Span) -> Self {
        Error::simple(ErrorKind::Lexical, reason).with_span(Some(span))
    }

    pub fn parse<S: ToString>(reason: S, span: Span) -> Self {
        Error::simple(ErrorKind::Parse, reason).with_span(Some(span))
    }

    pub fn name<S: ToString>(reason: S) -> Self {
        Error::simple(ErrorKind::Name, reason)
    }

    pub fn semantic<S: ToString>(reason: S) -> Self {
        Error::simple(ErrorKind::Semantic, reason)
    }

    pub fn resolver<S: ToString>(reason: S) -> Self {
        Error::simple(ErrorKind::Resolver, reason)
    }

    pub fn translation<S: ToString>(reason: S) -> Self {
        Error::simple(ErrorKind::Translation, reason)
    }

    pub fn estimator<S: ToString>(reason: S) -> Self {
        Error::simple(ErrorKind::Estimator, reason)
    }

    pub fn cancelled() -> Self {
        Error::simple(ErrorKind::Cancelled, "the compilation was cancelled")
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Simple(text) => f.write_str(text),
            Reason::Expected {
                who,
                expected,
                found,
            } => {
                if let Some(who) = who {
                    write!(f, "{who} ")?;
                }
                write!(f, "expected {expected}, found {found}")
            }
            Reason::Unexpected { found } => write!(f, "unexpected {found}"),
            Reason::NotFound { name, namespace } => write!(f, "{namespace} `{name}` not found"),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = self.span {
            write!(f, "{:?}: {}", span, self.reason)
        } else {
            write!(f, "{}", self.reason)
        }
    }
}

impl std::error::Error for Error {}

pub trait WithErrorInfo: Sized {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self;
    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self;
    fn with_span(self, span: Option<Span>) -> Self;
}

impl WithErrorInfo for Error {
    fn push_hint<S: Into<String>>(mut self, hint: S) -> Self {
        self.hints.push(hint.into());
        self
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(mut self, hints: I) -> Self {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }
}

impl<T, E: WithErrorInfo> WithErrorInfo for Result<T, E> {
    fn push_hint<S: Into<String>>(self, hint: S) -> Self {
        self.map_err(|e| e.push_hint(hint))
    }

    fn with_hints<S: Into<String>, I: IntoIterator<Item = S>>(self, hints: I) -> Self {
        self.map_err(|e| e.with_hints(hints))
    }

    fn with_span(self, span: Option<Span>) -> Self {
        self.map_err(|e| e.with_span(span))
    }
}
