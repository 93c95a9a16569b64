use crate::lexer::{InvalidSymbol, Term};
use std::fmt;

/// Raised for unknown keyword heads, undefined variables, oversized numeric
/// literals, missing string arrays, nested function definitions, and
/// non-numeric `alloc` sizes. Carries the offending term and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermError {
    pub term: Term,
    pub message: String,
}

impl TermError {
    pub fn new(term: &Term, message: impl Into<String>) -> TermError {
        TermError { term: term.clone(), message: message.into() }
    }
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} in term `{}`", self.message, self.term)
    }
}

impl std::error::Error for TermError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lex(InvalidSymbol),
    Term(TermError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{}", e),
            Error::Term(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<InvalidSymbol> for Error {
    fn from(err: InvalidSymbol) -> Error {
        Error::Lex(err)
    }
}

impl From<TermError> for Error {
    fn from(err: TermError) -> Error {
        Error::Term(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
