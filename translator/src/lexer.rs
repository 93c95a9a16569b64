//! Turns source text into a sequence of nested *terms* — the parenthesised
//! surface syntax has no separate grammar of its own beyond balancing
//! parentheses and grouping whitespace-delimited atoms.

use std::fmt;

/// A single parsed form: either a leaf atom or an ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Atom(String),
    List(Vec<Term>),
}

impl Term {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(s) => Some(s),
            Term::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items),
            Term::Atom(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Atom(s) => write!(f, "{}", s),
            Term::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A character outside the atom alphabet was encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSymbol {
    pub line: usize,
    pub column: usize,
    pub char: char,
}

impl fmt::Display for InvalidSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid symbol {:?} at line {}, column {}",
            self.char, self.line, self.column
        )
    }
}

impl std::error::Error for InvalidSymbol {}

fn is_atom_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || "+-%=!&".contains(c)
}

struct Lexer {
    terms: Vec<Term>,
    stack: Vec<Vec<Term>>,
    current: String,
    in_string: bool,
}

impl Lexer {
    fn new() -> Lexer {
        Lexer {
            terms: Vec::new(),
            stack: Vec::new(),
            current: String::new(),
            in_string: false,
        }
    }

    fn flush_atom(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let atom = Term::Atom(std::mem::take(&mut self.current));
        if let Some(top) = self.stack.last_mut() {
            top.push(atom);
        }
    }

    fn open_paren(&mut self) {
        self.stack.push(Vec::new());
    }

    fn close_paren(&mut self) {
        if let Some(items) = self.stack.pop() {
            let list = Term::List(items);
            match self.stack.last_mut() {
                Some(top) => top.push(list),
                None => self.terms.push(list),
            }
        }
    }

    fn process_char(&mut self, c: char, line: usize, column: usize) -> Result<(), InvalidSymbol> {
        if self.in_string {
            self.current.push(c);
            if c == '\'' {
                self.in_string = false;
                self.flush_atom();
            }
            return Ok(());
        }

        match c {
            '(' => {
                self.flush_atom();
                self.open_paren();
            }
            ')' => {
                self.flush_atom();
                self.close_paren();
            }
            '\'' => {
                self.current.push(c);
                self.in_string = true;
            }
            c if c.is_whitespace() => self.flush_atom(),
            c if is_atom_char(c) => self.current.push(c),
            _ => return Err(InvalidSymbol { line, column, char: c }),
        }

        Ok(())
    }
}

/// Lexes `text` into an ordered sequence of top-level terms.
///
/// Unterminated strings and mismatched parentheses are not detected here —
/// they surface later as malformed term trees when the translator walks
/// them.
///
/// # Examples
/// ```
/// use translator::lexer::{text_to_terms, Term};
///
/// let terms = text_to_terms("(print_int 5)").unwrap();
/// assert_eq!(terms.len(), 1);
/// assert_eq!(terms[0].as_list().unwrap()[0], Term::Atom("print_int".to_owned()));
/// ```
pub fn text_to_terms(text: &str) -> Result<Vec<Term>, InvalidSymbol> {
    let mut lexer = Lexer::new();

    for (line_index, line) in text.split('\n').enumerate() {
        for (col_index, c) in line.chars().enumerate() {
            lexer.process_char(c, line_index + 1, col_index + 1)?;
        }
        if lexer.in_string {
            lexer.current.push('\n');
        } else {
            lexer.flush_atom();
        }
    }

    lexer.flush_atom();

    Ok(lexer.terms)
}
