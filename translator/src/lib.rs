//! Translates S-expression source into a flat memory image for the
//! [accvm](../accvm/index.html) simulator.
//!
//! Source is a sequence of parenthesised terms. [`lexer::text_to_terms`]
//! turns the text into a term tree; [`codegen::Translator`] walks that tree,
//! accumulating a data segment and a code segment, and finally concatenates
//! them into the 2048-cell image the simulator expects.
//!
//! ```
//! use translator::translate;
//!
//! let memory = translate("(print_int (+ 2 3))").unwrap();
//! assert_eq!(memory.cells().len(), 2048);
//! ```

#[macro_use]
extern crate log;

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod listing;
pub mod symbols;

#[cfg(test)]
mod test;

pub use error::{Error, Result, TermError};

use accvm::Memory;
use codegen::Translator;

/// Lexes and translates `source`, producing a complete 2048-cell memory
/// image ready to run or write to an image file.
pub fn translate(source: &str) -> Result<Memory> {
    let terms = lexer::text_to_terms(source)?;
    debug!("lexed {} top-level term(s)", terms.len());
    Translator::new().translate(&terms)
}
