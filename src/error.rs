//! Crate-wide error sum type.
//!
//! Every error kind carries the cursor it happened at (where known) so the
//! caller can render a source excerpt with a caret, the same way the
//! teacher's `TypeCheckError`/`ParseError` carry a `Span`.

use std::fmt::Display;

use crate::cursor::{Cursor, TextDocument};

#[derive(Debug, Clone, PartialEq)]
pub enum AuraError {
    Lex(String, Option<Cursor>),
    Parse(String, Option<Cursor>),
    Type(String, Option<Cursor>),
    Name(String, Option<Cursor>),
    Arity(String, Option<Cursor>),
    Cast(String, Option<Cursor>),
    GenerativeCast(String, Option<Cursor>),
    Import(String),
    Provider(String),
}

impl AuraError {
    pub fn cursor(&self) -> Option<Cursor> {
        match self {
            AuraError::Lex(_, at)
            | AuraError::Parse(_, at)
            | AuraError::Type(_, at)
            | AuraError::Name(_, at)
            | AuraError::Arity(_, at)
            | AuraError::Cast(_, at)
            | AuraError::GenerativeCast(_, at) => *at,
            AuraError::Import(_) | AuraError::Provider(_) => None,
        }
    }

    fn message(&self) -> &str {
        match self {
            AuraError::Lex(m, _)
            | AuraError::Parse(m, _)
            | AuraError::Type(m, _)
            | AuraError::Name(m, _)
            | AuraError::Arity(m, _)
            | AuraError::Cast(m, _)
            | AuraError::GenerativeCast(m, _)
            | AuraError::Import(m)
            | AuraError::Provider(m) => m,
        }
    }

    /// Render this error against the document it was raised on, including a
    /// source excerpt and caret pointer where a cursor is known.
    pub fn render(&self, doc: &TextDocument) -> String {
        match self.cursor() {
            Some(at) => {
                let mut lines = doc.indicate(at);
                lines.push(self.message().to_string());
                lines.join("\n")
            }
            None => self.message().to_string(),
        }
    }

    pub fn lex(message: impl Into<String>, at: Cursor) -> Self {
        AuraError::Lex(message.into(), Some(at))
    }

    pub fn parse(message: impl Into<String>, at: Option<Cursor>) -> Self {
        AuraError::Parse(message.into(), at)
    }

    pub fn name(message: impl Into<String>, at: Option<Cursor>) -> Self {
        AuraError::Name(message.into(), at)
    }

    pub fn undefined_identifier(name: &str, at: Option<Cursor>) -> Self {
        AuraError::Name(format!("undefined identifier '{name}'"), at)
    }

    pub fn field_not_found(name: &str, at: Option<Cursor>) -> Self {
        AuraError::Name(format!("Field '{name}' not found"), at)
    }

    pub fn unknown_type(name: &str, at: Option<Cursor>) -> Self {
        AuraError::Name(format!("unknown type '{name}'"), at)
    }

    pub fn division_by_zero(at: Option<Cursor>) -> Self {
        AuraError::Type("DivisionByZero".to_string(), at)
    }
}

impl Display for AuraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            AuraError::Lex(..) => "LexError",
            AuraError::Parse(..) => "ParseError",
            AuraError::Type(..) => "TypeError",
            AuraError::Name(..) => "NameError",
            AuraError::Arity(..) => "ArityError",
            AuraError::Cast(..) => "CastError",
            AuraError::GenerativeCast(..) => "GenerativeCastError",
            AuraError::Import(..) => "ImportError",
            AuraError::Provider(..) => "ProviderError",
        };
        match self.cursor() {
            Some(at) => write!(f, "{kind} at {at}: {}", self.message()),
            None => write!(f, "{kind}: {}", self.message()),
        }
    }
}

impl std::error::Error for AuraError {}

impl From<anyhow::Error> for AuraError {
    fn from(value: anyhow::Error) -> Self {
        AuraError::Import(value.to_string())
    }
}

pub type AuraResult<T> = Result<T, AuraError>;
